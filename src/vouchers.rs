//! Voucher catalog, scoping rules and eligibility filtering.

use jiff::Timestamp;
use rustc_hash::FxHashSet;
use uuid::Uuid;

/// The reduction a voucher grants against the order subtotal.
///
/// The wire format carries `amount` and `percent` as separate nullable
/// fields with a `type` discriminator; exactly one is authoritative, so the
/// domain model folds them into a single enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoucherDiscount {
    /// Subtract a fixed amount, in minor currency units.
    Fixed {
        /// Amount off, in minor currency units.
        amount: u64,
    },

    /// Subtract a floored percentage of the subtotal.
    Percent {
        /// Percent off, nominally 0–100.
        percent: u8,

        /// Optional cap on the computed discount, in minor currency units.
        max_amount: Option<u64>,
    },
}

/// Which products a voucher may be applied against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoucherScope {
    /// Applicable to any product.
    AllProducts,

    /// Applicable only when the selection includes at least one of these
    /// products.
    Products(FxHashSet<Uuid>),
}

/// Server-reported voucher lifecycle status.
///
/// Informational only: eligibility is recomputed client-side from the
/// voucher fields, and the server re-judges at submit time regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherStatus {
    /// Currently redeemable according to the server.
    Active,

    /// Redemption limit reached.
    Used,

    /// Validity window has passed.
    Expired,

    /// Validity window has not opened yet.
    NotStarted,
}

/// A discount voucher, read-only from the client's perspective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voucher {
    /// Voucher identifier.
    pub uuid: Uuid,

    /// Human-readable redemption code, unique in the catalog.
    pub code: String,

    /// The reduction this voucher grants.
    pub discount: VoucherDiscount,

    /// Minimum order subtotal, if any. `None` means no floor.
    pub min_order_value: Option<u64>,

    /// Start of the validity window, inclusive.
    pub starts_at: Timestamp,

    /// End of the validity window, inclusive.
    pub ends_at: Timestamp,

    /// Total redemption cap, if any. `Some(0)` is a real cap of zero,
    /// distinct from `None`.
    pub usage_limit: Option<u32>,

    /// Redemptions so far.
    pub used_count: u32,

    /// Product scope.
    pub scope: VoucherScope,

    /// Server-reported status.
    pub status: VoucherStatus,
}

/// Checkout-time facts a voucher is judged against.
///
/// Ephemeral: derived from the current selection whenever it changes, never
/// persisted.
#[derive(Debug, Clone)]
pub struct CheckoutContext {
    /// Current wall-clock time.
    pub now: Timestamp,

    /// Subtotal over the selected items, in minor currency units.
    pub subtotal: u64,

    /// Products covered by the selected items.
    pub product_uuids: FxHashSet<Uuid>,
}

impl Voucher {
    /// Whether this voucher may be applied in `context`.
    ///
    /// All four conditions must hold: the validity window contains `now`,
    /// redemptions remain under the usage limit, the subtotal meets the
    /// minimum order value, and the product scope intersects the selection.
    #[must_use]
    pub fn is_eligible(&self, context: &CheckoutContext) -> bool {
        self.window_contains(context.now)
            && self.has_remaining_uses()
            && self.meets_minimum(context.subtotal)
            && self.covers_any_of(&context.product_uuids)
    }

    /// Whether `now` falls inside the validity window, inclusive on both
    /// ends.
    #[must_use]
    pub fn window_contains(&self, now: Timestamp) -> bool {
        self.starts_at <= now && now <= self.ends_at
    }

    fn has_remaining_uses(&self) -> bool {
        self.usage_limit.is_none_or(|limit| self.used_count < limit)
    }

    fn meets_minimum(&self, subtotal: u64) -> bool {
        self.min_order_value.is_none_or(|min| subtotal >= min)
    }

    fn covers_any_of(&self, product_uuids: &FxHashSet<Uuid>) -> bool {
        match &self.scope {
            VoucherScope::AllProducts => true,
            VoucherScope::Products(eligible) => {
                product_uuids.iter().any(|uuid| eligible.contains(uuid))
            }
        }
    }
}

/// Filter a voucher catalog down to those applicable in `context`.
///
/// Catalog order is preserved; the filter does not rank by best discount,
/// the user picks one. A failed catalog fetch upstream yields an empty
/// slice here and therefore an empty result, never an error.
#[must_use]
pub fn eligible<'a>(vouchers: &'a [Voucher], context: &CheckoutContext) -> Vec<&'a Voucher> {
    vouchers
        .iter()
        .filter(|voucher| voucher.is_eligible(context))
        .collect()
}
