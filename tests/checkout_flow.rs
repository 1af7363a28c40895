//! End-to-end checkout scenarios over a mocked storefront backend.

use std::sync::Arc;

use jiff::Timestamp;
use testresult::TestResult;
use uuid::Uuid;

use posy::{
    api::{CheckoutResponse, MockStorefrontApi},
    cart::{Cart, CartItem},
    checkout::{
        CheckoutError, CheckoutOrchestrator, CheckoutState, DeliveryDetails,
        redirect::PaymentOutcome,
    },
    vouchers::{Voucher, VoucherDiscount, VoucherScope, VoucherStatus},
};

fn flower_cart() -> Cart {
    Cart {
        uuid: Uuid::now_v7(),
        items: vec![
            CartItem {
                uuid: Uuid::now_v7(),
                product_uuid: Uuid::now_v7(),
                unit_price: 100_000,
                quantity: 1,
                line_total: 100_000,
            },
            CartItem {
                uuid: Uuid::now_v7(),
                product_uuid: Uuid::now_v7(),
                unit_price: 100_000,
                quantity: 2,
                line_total: 200_000,
            },
        ],
    }
}

fn save10() -> Voucher {
    Voucher {
        uuid: Uuid::now_v7(),
        code: "SAVE10".to_owned(),
        discount: VoucherDiscount::Percent {
            percent: 10,
            max_amount: None,
        },
        min_order_value: None,
        starts_at: Timestamp::UNIX_EPOCH,
        ends_at: Timestamp::MAX,
        usage_limit: None,
        used_count: 0,
        scope: VoucherScope::AllProducts,
        status: VoucherStatus::Active,
    }
}

fn delivery_details() -> DeliveryDetails {
    DeliveryDetails {
        recipient_name: "Mai".to_owned(),
        recipient_phone: "0912345678".to_owned(),
        shipping_address: "45 Nguyen Hue, District 1".to_owned(),
        note: Some("ring the bell twice".to_owned()),
        requested_delivery_at: None,
    }
}

#[tokio::test]
async fn full_checkout_flow_from_selection_to_paid() -> TestResult {
    let cart = flower_cart();
    let fetched = cart.clone();
    let catalog = vec![save10()];

    let mut api = MockStorefrontApi::new();

    api.expect_fetch_cart()
        .returning(move || Ok(fetched.clone()));

    api.expect_fetch_vouchers()
        .returning(move || Ok(catalog.clone()));

    api.expect_submit_checkout()
        .withf(|payload| {
            payload.voucher_code.as_deref() == Some("SAVE10") && payload.item_uuids.len() == 2
        })
        .times(1)
        .returning(|_| {
            Ok(CheckoutResponse {
                checkout_url: Some("https://pay.example/gateway?order=42".to_owned()),
                message: None,
            })
        });

    let mut orchestrator = CheckoutOrchestrator::new(Arc::new(api), Uuid::now_v7());

    orchestrator.load_cart().await?;

    assert_eq!(orchestrator.state(), CheckoutState::Composing);
    assert_eq!(orchestrator.subtotal(), 300_000);

    let now = Timestamp::UNIX_EPOCH;
    let vouchers = orchestrator.eligible_vouchers(now).await;

    let picked = vouchers.into_iter().next();
    assert!(picked.is_some(), "SAVE10 should be eligible");

    if let Some(voucher) = picked {
        orchestrator.apply_voucher(voucher, now)?;
    }

    assert_eq!(orchestrator.discount_amount()?, 30_000);
    assert_eq!(orchestrator.final_total()?, 270_000);

    orchestrator.submit(&delivery_details()).await?;

    assert_eq!(orchestrator.state(), CheckoutState::AwaitingPayment);
    assert_eq!(
        orchestrator.payment_url(),
        Some("https://pay.example/gateway?order=42")
    );

    let outcome = orchestrator.handle_redirect("https://pay.example/return?status=PAID")?;

    assert_eq!(outcome, Some(PaymentOutcome::Success));
    assert_eq!(orchestrator.state(), CheckoutState::Completed);

    Ok(())
}

#[tokio::test]
async fn cancelled_payment_terminates_the_session() -> TestResult {
    let cart = flower_cart();
    let fetched = cart.clone();

    let mut api = MockStorefrontApi::new();

    api.expect_fetch_cart()
        .returning(move || Ok(fetched.clone()));

    api.expect_submit_checkout().returning(|_| {
        Ok(CheckoutResponse {
            checkout_url: Some("https://pay.example/gateway?order=43".to_owned()),
            message: None,
        })
    });

    let mut orchestrator = CheckoutOrchestrator::new(Arc::new(api), Uuid::now_v7());

    orchestrator.load_cart().await?;
    orchestrator.submit(&delivery_details()).await?;

    // Intermediate gateway pages are not terminal.
    let outcome = orchestrator.handle_redirect("https://pay.example/gateway/qr?order=43")?;
    assert_eq!(outcome, None);
    assert_eq!(orchestrator.state(), CheckoutState::AwaitingPayment);

    let outcome = orchestrator.handle_redirect("https://pay.example/return?status=CANCELLED")?;

    assert_eq!(outcome, Some(PaymentOutcome::Cancelled));
    assert_eq!(orchestrator.state(), CheckoutState::Cancelled);

    let result = orchestrator.submit(&delivery_details()).await;
    assert!(
        matches!(result, Err(CheckoutError::SessionClosed)),
        "expected SessionClosed after cancellation"
    );

    Ok(())
}

#[tokio::test]
async fn resubmission_while_awaiting_payment_is_rejected() -> TestResult {
    let cart = flower_cart();
    let fetched = cart.clone();

    let mut api = MockStorefrontApi::new();

    api.expect_fetch_cart()
        .returning(move || Ok(fetched.clone()));

    api.expect_submit_checkout().times(1).returning(|_| {
        Ok(CheckoutResponse {
            checkout_url: Some("https://pay.example/gateway?order=44".to_owned()),
            message: None,
        })
    });

    let mut orchestrator = CheckoutOrchestrator::new(Arc::new(api), Uuid::now_v7());

    orchestrator.load_cart().await?;
    orchestrator.submit(&delivery_details()).await?;

    let result = orchestrator.submit(&delivery_details()).await;

    assert!(
        matches!(result, Err(CheckoutError::SubmissionInFlight)),
        "expected SubmissionInFlight"
    );
    assert_eq!(orchestrator.state(), CheckoutState::AwaitingPayment);

    Ok(())
}

#[tokio::test]
async fn user_abort_requires_payment_phase_and_cancels() -> TestResult {
    let cart = flower_cart();
    let fetched = cart.clone();

    let mut api = MockStorefrontApi::new();

    api.expect_fetch_cart()
        .returning(move || Ok(fetched.clone()));

    api.expect_submit_checkout().returning(|_| {
        Ok(CheckoutResponse {
            checkout_url: Some("https://pay.example/gateway?order=45".to_owned()),
            message: None,
        })
    });

    let mut orchestrator = CheckoutOrchestrator::new(Arc::new(api), Uuid::now_v7());

    orchestrator.load_cart().await?;

    let early_abort = orchestrator.abort_payment();
    assert!(
        matches!(early_abort, Err(CheckoutError::NotAwaitingPayment)),
        "expected NotAwaitingPayment before submission"
    );

    orchestrator.submit(&delivery_details()).await?;
    orchestrator.abort_payment()?;

    assert_eq!(orchestrator.state(), CheckoutState::Cancelled);

    Ok(())
}

#[tokio::test]
async fn server_side_rejection_surfaces_and_preserves_the_session() -> TestResult {
    let cart = flower_cart();
    let fetched = cart.clone();

    let mut api = MockStorefrontApi::new();

    api.expect_fetch_cart()
        .returning(move || Ok(fetched.clone()));

    // The client does not re-validate the voucher at submit time; the
    // backend is the authority and may reject.
    api.expect_submit_checkout().returning(|_| {
        Ok(CheckoutResponse {
            checkout_url: None,
            message: Some("voucher SAVE10 is no longer available".to_owned()),
        })
    });

    let mut orchestrator = CheckoutOrchestrator::new(Arc::new(api), Uuid::now_v7());

    orchestrator.load_cart().await?;
    orchestrator.apply_voucher(save10(), Timestamp::UNIX_EPOCH)?;

    let result = orchestrator.submit(&delivery_details()).await;

    assert!(
        matches!(result, Err(CheckoutError::Rejected(message)) if message.contains("SAVE10")),
        "expected Rejected with the server message"
    );
    assert_eq!(orchestrator.state(), CheckoutState::Composing);
    assert_eq!(orchestrator.subtotal(), 300_000);
    assert!(orchestrator.applied_voucher().is_some());

    Ok(())
}
