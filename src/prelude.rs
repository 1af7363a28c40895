//! Posy prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    api::{
        ApiError, AuthContext, CheckoutPayload, CheckoutResponse, HttpStorefrontApi,
        StorefrontApi, StorefrontConfig,
    },
    cart::{Cart, CartItem, Selection},
    checkout::{
        CheckoutError, CheckoutOrchestrator, CheckoutState, DeliveryDetails,
        redirect::PaymentOutcome,
    },
    discounts::{DiscountError, discount_amount, final_total},
    vouchers::{
        CheckoutContext, Voucher, VoucherDiscount, VoucherScope, VoucherStatus, eligible,
    },
};
