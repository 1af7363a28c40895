//! Cart line items and the checkout selection set.

use rustc_hash::FxHashSet;
use uuid::Uuid;

/// A cart line item as reported by the storefront backend.
///
/// `line_total` is computed server-side from `unit_price` and `quantity` and
/// is never recomputed locally; the backend owns all pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// Line item identifier, unique within the cart.
    pub uuid: Uuid,

    /// Product this line refers to.
    pub product_uuid: Uuid,

    /// Price of a single unit, in minor currency units.
    pub unit_price: u64,

    /// Number of units on this line.
    pub quantity: u32,

    /// Server-computed total for this line, in minor currency units.
    pub line_total: u64,
}

/// A read replica of the server-side cart.
///
/// Stale after any mutating call; callers refetch the whole cart rather than
/// patching it locally, so server-computed line totals never diverge.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    /// Cart identifier.
    pub uuid: Uuid,

    /// Line items in catalog order.
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Whether an item with the given uuid is present in the cart.
    #[must_use]
    pub fn contains(&self, item: Uuid) -> bool {
        self.items.iter().any(|i| i.uuid == item)
    }
}

/// The set of cart items marked for checkout.
///
/// Always a subset of the item uuids present in the cart it was derived
/// from. A fresh cart starts with everything selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: FxHashSet<Uuid>,
}

impl Selection {
    /// Select every item currently in `cart`.
    #[must_use]
    pub fn all(cart: &Cart) -> Self {
        Self {
            selected: cart.items.iter().map(|item| item.uuid).collect(),
        }
    }

    /// An empty selection.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Flip membership of `item` in the selection.
    ///
    /// Unknown uuids are ignored: the UI should never produce one, but a tap
    /// raced against a cart refresh must not break checkout.
    pub fn toggle(&mut self, cart: &Cart, item: Uuid) {
        if !cart.contains(item) {
            return;
        }

        if !self.selected.remove(&item) {
            self.selected.insert(item);
        }
    }

    /// Select every item currently in `cart`.
    pub fn select_all(&mut self, cart: &Cart) {
        self.selected = cart.items.iter().map(|item| item.uuid).collect();
    }

    /// Clear the selection.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop selections for items no longer present in `cart`.
    ///
    /// Applied after every cart refetch, keeping the subset invariant across
    /// server-side removals.
    pub fn retain_present(&mut self, cart: &Cart) {
        self.selected.retain(|uuid| cart.contains(*uuid));
    }

    /// Whether the selection contains `item`.
    #[must_use]
    pub fn contains(&self, item: Uuid) -> bool {
        self.selected.contains(&item)
    }

    /// Whether nothing is selected. Checkout is unavailable in this state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Number of selected items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Iterate the selected items of `cart` in cart order.
    pub fn items<'a>(&'a self, cart: &'a Cart) -> impl Iterator<Item = &'a CartItem> {
        cart.items
            .iter()
            .filter(move |item| self.selected.contains(&item.uuid))
    }

    /// Sum of server-supplied line totals over the selected items.
    ///
    /// An empty selection sums to zero.
    #[must_use]
    pub fn subtotal(&self, cart: &Cart) -> u64 {
        self.items(cart).map(|item| item.line_total).sum()
    }

    /// Product uuids covered by the selected items.
    #[must_use]
    pub fn product_uuids(&self, cart: &Cart) -> FxHashSet<Uuid> {
        self.items(cart).map(|item| item.product_uuid).collect()
    }
}
