//! Client-side authentication context.
//!
//! Replaces the ambient token store of earlier storefront clients: the
//! bearer token and the unauthorized hook are explicit inputs to the API
//! client, so it never reaches into navigation or module-level globals.

use std::{fmt, sync::Arc};

/// Hook invoked when the backend answers 401.
///
/// The caller decides what that means (typically: clear the session and show
/// the login screen).
pub type OnUnauthorized = Arc<dyn Fn() + Send + Sync>;

/// Authentication state handed to the API client at construction.
#[derive(Clone, Default)]
pub struct AuthContext {
    bearer_token: Option<String>,
    on_unauthorized: Option<OnUnauthorized>,
}

impl AuthContext {
    /// Context without credentials, for endpoints that allow it.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context carrying a bearer token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
            on_unauthorized: None,
        }
    }

    /// Attach an unauthorized hook.
    #[must_use]
    pub fn on_unauthorized(mut self, hook: OnUnauthorized) -> Self {
        self.on_unauthorized = Some(hook);
        self
    }

    /// The bearer token, if present.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Invoke the unauthorized hook, if one was attached.
    pub(crate) fn notify_unauthorized(&self) {
        if let Some(hook) = &self.on_unauthorized {
            hook();
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "***"))
            .field("on_unauthorized", &self.on_unauthorized.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn token_is_exposed_but_not_debug_printed() {
        let auth = AuthContext::with_token("secret-token");

        assert_eq!(auth.token(), Some("secret-token"));
        assert!(!format!("{auth:?}").contains("secret-token"));
    }

    #[test]
    fn notify_invokes_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let auth = AuthContext::with_token("token")
            .on_unauthorized(Arc::new(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            }));

        auth.notify_unauthorized();
        auth.notify_unauthorized();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn notify_without_hook_is_a_no_op() {
        AuthContext::anonymous().notify_unauthorized();
    }
}
