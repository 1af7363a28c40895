//! Payment redirect classification.
//!
//! The payment gateway signals its terminal state only through the URL the
//! webview is redirected to; the client inspects it for known markers.

/// Terminal outcome signalled by a payment-gateway redirect URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Payment completed.
    Success,

    /// Payment cancelled at the gateway.
    Cancelled,
}

const SUCCESS_MARKERS: [&str; 3] = ["/success", "success=true", "status=PAID"];
const CANCEL_MARKERS: [&str; 3] = ["/cancel", "cancel=true", "status=CANCELLED"];

impl PaymentOutcome {
    /// Classify a redirect URL, or `None` for intermediate gateway pages.
    ///
    /// Success markers are checked first; a URL somehow carrying both
    /// families classifies as success.
    #[must_use]
    pub fn from_redirect_url(url: &str) -> Option<Self> {
        if SUCCESS_MARKERS.iter().any(|marker| url.contains(marker)) {
            return Some(Self::Success);
        }

        if CANCEL_MARKERS.iter().any(|marker| url.contains(marker)) {
            return Some(Self::Cancelled);
        }

        None
    }
}
