//! Posy
//!
//! Client-side checkout engine for the Posy flower storefront. The backend
//! owns pricing, inventory and payment; this crate computes the pieces the
//! client is responsible for: which cart lines are selected, which vouchers
//! are currently applicable, the discount a chosen voucher grants, and the
//! linear checkout state machine from composing an order through the payment
//! redirect.
//!
//! All currency amounts are integer minor units supplied by the server.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod discounts;
pub mod prelude;
pub mod vouchers;
