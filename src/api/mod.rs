//! Storefront API client seam.
//!
//! The engine talks to the backend only through [`StorefrontApi`]; tests
//! inject [`MockStorefrontApi`] and the application wires up
//! [`HttpStorefrontApi`].

mod auth;
mod dto;
mod http;

pub use auth::{AuthContext, OnUnauthorized};
pub use dto::VoucherDataError;
pub use http::{HttpStorefrontApi, StorefrontConfig};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{cart::Cart, vouchers::Voucher};

/// Errors from the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected the request as unauthenticated.
    #[error("request was rejected as unauthorized")]
    Unauthorized,

    /// The backend answered with an unexpected status or body.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Transport-level failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// The order-submission request body.
///
/// Combines recipient and delivery details with the selected items and the
/// applied voucher code, exactly as the checkout endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    /// Account placing the order.
    pub user_uuid: Uuid,

    /// Recipient display name.
    pub recipient_name: String,

    /// Recipient phone number.
    pub recipient_phone: String,

    /// Delivery address.
    pub shipping_address: String,

    /// Free-text note for the florist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Requested delivery time, if the customer picked one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_delivery_at: Option<Timestamp>,

    /// Code of the applied voucher, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,

    /// Selected cart item uuids, in cart order.
    pub item_uuids: Vec<Uuid>,
}

/// Response from the checkout endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Payment page to open when the order was accepted.
    pub checkout_url: Option<String>,

    /// Human-readable status or rejection message.
    pub message: Option<String>,
}

/// Client for the storefront REST backend.
#[automock]
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Fetch the current cart read replica.
    async fn fetch_cart(&self) -> Result<Cart, ApiError>;

    /// Fetch the voucher catalog for this checkout session.
    async fn fetch_vouchers(&self) -> Result<Vec<Voucher>, ApiError>;

    /// Submit an assembled checkout request.
    async fn submit_checkout(
        &self,
        payload: &CheckoutPayload,
    ) -> Result<CheckoutResponse, ApiError>;
}
