//! Checkout orchestration.
//!
//! Drives a checkout session through its linear state machine: Idle while
//! nothing is selected, Composing while the order is being put together,
//! Submitting while the request is in flight, AwaitingPayment while the
//! gateway webview is open, then Completed or Cancelled.
//!
//! Totals are derived from the current `(selection, voucher)` state on every
//! read, so a selection change after a voucher is applied can never submit a
//! stale discount.

pub mod redirect;

use std::{fmt, sync::Arc};

use jiff::Timestamp;
use thiserror::Error;
use tracing::{Span, info, warn};
use uuid::Uuid;

use crate::{
    api::{ApiError, CheckoutPayload, StorefrontApi},
    cart::{Cart, Selection},
    discounts::{self, DiscountError},
    vouchers::{CheckoutContext, Voucher},
};

use redirect::PaymentOutcome;

/// Where the checkout flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// Nothing selected; checkout unavailable.
    Idle,

    /// Items selected; totals live.
    Composing,

    /// Submission in flight; repeated submits are rejected.
    Submitting,

    /// Payment page open; waiting on the gateway redirect.
    AwaitingPayment,

    /// Payment reported successful. Terminal.
    Completed,

    /// Payment cancelled or aborted. Terminal.
    Cancelled,
}

/// Recipient and delivery details captured by the checkout form.
#[derive(Debug, Clone, Default)]
pub struct DeliveryDetails {
    /// Recipient display name.
    pub recipient_name: String,

    /// Recipient phone number.
    pub recipient_phone: String,

    /// Delivery address. Required before submission.
    pub shipping_address: String,

    /// Free-text note for the florist.
    pub note: Option<String>,

    /// Requested delivery time, if the customer picked one.
    pub requested_delivery_at: Option<Timestamp>,
}

/// Errors raised by the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout was triggered with nothing selected.
    #[error("no items are selected for checkout")]
    EmptySelection,

    /// The delivery details have no shipping address.
    #[error("a shipping address is required")]
    MissingAddress,

    /// A submission or payment is already in flight.
    #[error("a checkout is already in progress")]
    SubmissionInFlight,

    /// The session already completed or was cancelled.
    #[error("this checkout session has already finished")]
    SessionClosed,

    /// A redirect or abort arrived outside the payment phase.
    #[error("checkout is not awaiting payment")]
    NotAwaitingPayment,

    /// The chosen voucher does not apply to the current selection.
    #[error("voucher {0} is not applicable to the current selection")]
    IneligibleVoucher(String),

    /// The backend accepted the request but returned no payment URL.
    #[error("checkout was rejected: {0}")]
    Rejected(String),

    /// Discount arithmetic failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Drives a single checkout session from item selection through the payment
/// redirect.
///
/// All mutation happens on the caller's single logical thread; the only
/// suspension points are the API calls. Dropping the orchestrator abandons
/// the session without side effects — nothing is persisted locally.
pub struct CheckoutOrchestrator {
    api: Arc<dyn StorefrontApi>,
    user_uuid: Uuid,
    cart: Cart,
    selection: Selection,
    voucher: Option<Voucher>,
    payment_url: Option<String>,
    state: CheckoutState,
}

impl CheckoutOrchestrator {
    /// Create an orchestrator for the given user over the given API client.
    #[must_use]
    pub fn new(api: Arc<dyn StorefrontApi>, user_uuid: Uuid) -> Self {
        Self {
            api,
            user_uuid,
            cart: Cart::default(),
            selection: Selection::none(),
            voucher: None,
            payment_url: None,
            state: CheckoutState::Idle,
        }
    }

    /// Fetch the cart and select everything, the default for a fresh
    /// checkout screen.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the fetch fails; local state is untouched.
    pub async fn load_cart(&mut self) -> Result<(), CheckoutError> {
        let cart = self.api.fetch_cart().await?;

        self.selection = Selection::all(&cart);
        self.cart = cart;
        self.sync_state();

        Ok(())
    }

    /// Refetch the cart after a mutating call, keeping the selection for
    /// items that survived.
    ///
    /// The cart is a read replica; local patching would diverge from
    /// server-computed line totals, so a full refetch is the only refresh.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the fetch fails; local state is untouched.
    pub async fn refresh_cart(&mut self) -> Result<(), CheckoutError> {
        let cart = self.api.fetch_cart().await?;

        self.cart = cart;
        self.selection.retain_present(&self.cart);
        self.sync_state();

        Ok(())
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// The cart read replica.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The current selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The applied voucher, if any.
    #[must_use]
    pub fn applied_voucher(&self) -> Option<&Voucher> {
        self.voucher.as_ref()
    }

    /// The payment page URL, present while awaiting payment.
    #[must_use]
    pub fn payment_url(&self) -> Option<&str> {
        self.payment_url.as_deref()
    }

    /// Subtotal over the selected items, in minor currency units.
    #[must_use]
    pub fn subtotal(&self) -> u64 {
        self.selection.subtotal(&self.cart)
    }

    /// Discount granted by the applied voucher against the current subtotal.
    ///
    /// Derived on every call, never cached, so it always reflects the
    /// current selection.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if percentage arithmetic overflows.
    pub fn discount_amount(&self) -> Result<u64, DiscountError> {
        match &self.voucher {
            Some(voucher) => discounts::discount_amount(&voucher.discount, self.subtotal()),
            None => Ok(0),
        }
    }

    /// Payable total: subtotal minus discount, floored at zero.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if percentage arithmetic overflows.
    pub fn final_total(&self) -> Result<u64, DiscountError> {
        Ok(discounts::final_total(
            self.subtotal(),
            self.discount_amount()?,
        ))
    }

    /// The eligibility context for the current selection.
    #[must_use]
    pub fn context(&self, now: Timestamp) -> CheckoutContext {
        CheckoutContext {
            now,
            subtotal: self.subtotal(),
            product_uuids: self.selection.product_uuids(&self.cart),
        }
    }

    /// Flip an item in or out of the selection. Unknown uuids are ignored.
    pub fn toggle_item(&mut self, item: Uuid) {
        self.selection.toggle(&self.cart, item);
        self.sync_state();
    }

    /// Select every cart item.
    pub fn select_all(&mut self) {
        self.selection.select_all(&self.cart);
        self.sync_state();
    }

    /// Clear the selection. Checkout becomes unavailable until something is
    /// selected again.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.sync_state();
    }

    /// Fetch the voucher catalog and keep those applicable to the current
    /// selection, in catalog order.
    ///
    /// A failed fetch logs a warning and yields an empty list: checkout
    /// proceeds without a discount rather than failing.
    pub async fn eligible_vouchers(&self, now: Timestamp) -> Vec<Voucher> {
        let catalog = match self.api.fetch_vouchers().await {
            Ok(catalog) => catalog,
            Err(error) => {
                warn!(%error, "voucher catalog unavailable; continuing without discounts");

                return Vec::new();
            }
        };

        let context = self.context(now);

        catalog
            .into_iter()
            .filter(|voucher| voucher.is_eligible(&context))
            .collect()
    }

    /// Apply a voucher to the session.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::IneligibleVoucher`] if the voucher does not
    /// apply to the current selection at `now`.
    pub fn apply_voucher(&mut self, voucher: Voucher, now: Timestamp) -> Result<(), CheckoutError> {
        if !voucher.is_eligible(&self.context(now)) {
            return Err(CheckoutError::IneligibleVoucher(voucher.code));
        }

        info!(code = %voucher.code, "applied voucher");
        self.voucher = Some(voucher);

        Ok(())
    }

    /// Remove the applied voucher.
    pub fn remove_voucher(&mut self) {
        self.voucher = None;
    }

    /// Submit the composed order.
    ///
    /// Validation runs before any network call: an empty selection and a
    /// missing shipping address are rejected locally. The applied voucher is
    /// not re-validated here; the backend is the authority at submit time,
    /// and a rejection falls back to Composing with nothing lost.
    ///
    /// # Errors
    ///
    /// Returns a validation error before the network call, or an
    /// [`ApiError`] / [`CheckoutError::Rejected`] after it; in the latter
    /// cases the state rolls back to Composing and the user may retry.
    #[tracing::instrument(
        name = "checkout.submit",
        skip(self, details),
        fields(
            user_uuid = %self.user_uuid,
            subtotal = tracing::field::Empty,
            final_total = tracing::field::Empty,
            voucher = tracing::field::Empty
        ),
        err
    )]
    pub async fn submit(&mut self, details: &DeliveryDetails) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::Submitting | CheckoutState::AwaitingPayment => {
                return Err(CheckoutError::SubmissionInFlight);
            }
            CheckoutState::Completed | CheckoutState::Cancelled => {
                return Err(CheckoutError::SessionClosed);
            }
            CheckoutState::Idle | CheckoutState::Composing => {}
        }

        if self.selection.is_empty() {
            return Err(CheckoutError::EmptySelection);
        }

        if details.shipping_address.trim().is_empty() {
            return Err(CheckoutError::MissingAddress);
        }

        let span = Span::current();

        span.record("subtotal", self.subtotal());
        span.record("final_total", self.final_total()?);

        if let Some(voucher) = &self.voucher {
            span.record("voucher", voucher.code.as_str());
        }

        let payload = self.payload(details);

        self.state = CheckoutState::Submitting;

        match self.api.submit_checkout(&payload).await {
            Ok(response) => match response.checkout_url {
                Some(url) => {
                    info!("checkout accepted; awaiting payment");
                    self.payment_url = Some(url);
                    self.state = CheckoutState::AwaitingPayment;

                    Ok(())
                }
                None => {
                    self.state = CheckoutState::Composing;

                    Err(CheckoutError::Rejected(response.message.unwrap_or_else(
                        || "checkout did not return a payment URL".to_owned(),
                    )))
                }
            },
            Err(error) => {
                self.state = CheckoutState::Composing;

                Err(error.into())
            }
        }
    }

    /// Feed a payment-gateway redirect URL into the session.
    ///
    /// Terminal markers move the session to Completed or Cancelled;
    /// intermediate gateway pages leave it awaiting payment and return
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotAwaitingPayment`] outside the payment
    /// phase.
    pub fn handle_redirect(&mut self, url: &str) -> Result<Option<PaymentOutcome>, CheckoutError> {
        if self.state != CheckoutState::AwaitingPayment {
            return Err(CheckoutError::NotAwaitingPayment);
        }

        let outcome = PaymentOutcome::from_redirect_url(url);

        match outcome {
            Some(PaymentOutcome::Success) => {
                info!("payment completed");
                self.state = CheckoutState::Completed;
            }
            Some(PaymentOutcome::Cancelled) => {
                info!("payment cancelled at gateway");
                self.state = CheckoutState::Cancelled;
            }
            None => {}
        }

        Ok(outcome)
    }

    /// Abort an in-progress payment, e.g. when the user closes the webview.
    ///
    /// Confirmation is the UI's concern; the order record lives server-side
    /// regardless.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotAwaitingPayment`] outside the payment
    /// phase.
    pub fn abort_payment(&mut self) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::AwaitingPayment {
            return Err(CheckoutError::NotAwaitingPayment);
        }

        info!("payment aborted by user");
        self.state = CheckoutState::Cancelled;

        Ok(())
    }

    fn payload(&self, details: &DeliveryDetails) -> CheckoutPayload {
        CheckoutPayload {
            user_uuid: self.user_uuid,
            recipient_name: details.recipient_name.clone(),
            recipient_phone: details.recipient_phone.clone(),
            shipping_address: details.shipping_address.clone(),
            note: details.note.clone(),
            requested_delivery_at: details.requested_delivery_at,
            voucher_code: self.voucher.as_ref().map(|voucher| voucher.code.clone()),
            item_uuids: self
                .selection
                .items(&self.cart)
                .map(|item| item.uuid)
                .collect(),
        }
    }

    /// Keep the Idle/Composing split in step with the selection. In-flight
    /// and terminal states are never changed here.
    fn sync_state(&mut self) {
        self.state = match self.state {
            CheckoutState::Idle | CheckoutState::Composing => {
                if self.selection.is_empty() {
                    CheckoutState::Idle
                } else {
                    CheckoutState::Composing
                }
            }
            other => other,
        };
    }
}

impl fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("user_uuid", &self.user_uuid)
            .field("state", &self.state)
            .field("selected", &self.selection.len())
            .field("voucher", &self.voucher.as_ref().map(|v| v.code.as_str()))
            .finish_non_exhaustive()
    }
}
