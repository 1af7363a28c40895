//! Wire-format records for the storefront REST API.
//!
//! Optional voucher constraints are nullable on the wire and stay `Option`
//! through conversion: an absent `usageLimit` means "no limit", while a
//! present `0` is a real limit of zero.

use jiff::Timestamp;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    cart::{Cart, CartItem},
    vouchers::{Voucher, VoucherDiscount, VoucherScope, VoucherStatus},
};

/// Error converting a wire voucher into the domain model.
#[derive(Debug, Error)]
pub enum VoucherDataError {
    /// A `FIXED` voucher arrived without its amount.
    #[error("fixed voucher {0} is missing its amount")]
    MissingAmount(String),

    /// A `PERCENTAGE` voucher arrived without its percent.
    #[error("percentage voucher {0} is missing its percent")]
    MissingPercent(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartRecord {
    pub uuid: Uuid,
    #[serde(default)]
    pub items: Vec<CartItemRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartItemRecord {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub unit_price: u64,
    pub quantity: u32,
    pub line_total: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoucherRecord {
    pub uuid: Uuid,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: VoucherKind,
    pub amount: Option<u64>,
    pub percent: Option<u8>,
    pub max_discount_amount: Option<u64>,
    pub min_order_value: Option<u64>,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default)]
    pub apply_all_products: bool,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
    #[serde(default)]
    pub status: VoucherStatusRecord,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum VoucherKind {
    Fixed,
    Percentage,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum VoucherStatusRecord {
    #[default]
    Active,
    Used,
    Expired,
    NotStarted,
}

impl From<CartItemRecord> for CartItem {
    fn from(record: CartItemRecord) -> Self {
        Self {
            uuid: record.uuid,
            product_uuid: record.product_uuid,
            unit_price: record.unit_price,
            quantity: record.quantity,
            line_total: record.line_total,
        }
    }
}

impl From<CartRecord> for Cart {
    fn from(record: CartRecord) -> Self {
        Self {
            uuid: record.uuid,
            items: record.items.into_iter().map(CartItem::from).collect(),
        }
    }
}

impl From<VoucherStatusRecord> for VoucherStatus {
    fn from(record: VoucherStatusRecord) -> Self {
        match record {
            VoucherStatusRecord::Active => Self::Active,
            VoucherStatusRecord::Used => Self::Used,
            VoucherStatusRecord::Expired => Self::Expired,
            VoucherStatusRecord::NotStarted => Self::NotStarted,
        }
    }
}

impl TryFrom<VoucherRecord> for Voucher {
    type Error = VoucherDataError;

    fn try_from(record: VoucherRecord) -> Result<Self, Self::Error> {
        // The `type` field selects which of `amount`/`percent` is
        // authoritative; the other is ignored even when present.
        let discount = match record.kind {
            VoucherKind::Fixed => VoucherDiscount::Fixed {
                amount: record
                    .amount
                    .ok_or_else(|| VoucherDataError::MissingAmount(record.code.clone()))?,
            },
            VoucherKind::Percentage => VoucherDiscount::Percent {
                percent: record
                    .percent
                    .ok_or_else(|| VoucherDataError::MissingPercent(record.code.clone()))?,
                max_amount: record.max_discount_amount,
            },
        };

        let scope = if record.apply_all_products {
            VoucherScope::AllProducts
        } else {
            VoucherScope::Products(record.product_ids.into_iter().collect())
        };

        Ok(Self {
            uuid: record.uuid,
            code: record.code,
            discount,
            min_order_value: record.min_order_value,
            starts_at: record.starts_at,
            ends_at: record.ends_at,
            usage_limit: record.usage_limit,
            used_count: record.used_count,
            scope,
            status: record.status.into(),
        })
    }
}
