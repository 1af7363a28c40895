//! HTTP client for the storefront REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::warn;

use crate::{
    api::{
        ApiError, AuthContext, CheckoutPayload, CheckoutResponse, StorefrontApi,
        dto::{CartRecord, VoucherRecord},
    },
    cart::Cart,
    vouchers::Voucher,
};

/// Configuration for connecting to the storefront backend.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend base URL, e.g. `"https://api.posy.example"`.
    pub base_url: String,
}

/// HTTP implementation of [`StorefrontApi`] over reqwest.
#[derive(Debug, Clone)]
pub struct HttpStorefrontApi {
    config: StorefrontConfig,
    auth: AuthContext,
    http: Client,
}

impl HttpStorefrontApi {
    /// Create a new client from the given configuration and auth context.
    #[must_use]
    pub fn new(config: StorefrontConfig, auth: AuthContext) -> Self {
        Self {
            config,
            auth,
            http: Client::new(),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(format!("{}{path}", self.config.base_url)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.post(format!("{}{path}", self.config.base_url)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map a response to an error unless it was successful.
    ///
    /// A 401 additionally fires the auth context's unauthorized hook.
    async fn checked(&self, response: Response) -> Result<Response, ApiError> {
        if response.status() == StatusCode::UNAUTHORIZED {
            self.auth.notify_unauthorized();

            return Err(ApiError::Unauthorized);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(ApiError::UnexpectedResponse(format!(
                "request failed with status {status}: {text}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefrontApi {
    #[tracing::instrument(name = "api.fetch_cart", skip(self), err)]
    async fn fetch_cart(&self) -> Result<Cart, ApiError> {
        let response = self.get("/api/cart").send().await?;
        let record: CartRecord = self.checked(response).await?.json().await?;

        Ok(record.into())
    }

    #[tracing::instrument(name = "api.fetch_vouchers", skip(self), err)]
    async fn fetch_vouchers(&self) -> Result<Vec<Voucher>, ApiError> {
        let response = self.get("/api/vouchers").send().await?;
        let records: Vec<VoucherRecord> = self.checked(response).await?.json().await?;

        // Malformed entries are dropped rather than failing the catalog; a
        // voucher the client cannot interpret is simply not offered.
        let vouchers = records
            .into_iter()
            .filter_map(|record| match Voucher::try_from(record) {
                Ok(voucher) => Some(voucher),
                Err(error) => {
                    warn!(%error, "skipping malformed voucher");
                    None
                }
            })
            .collect();

        Ok(vouchers)
    }

    #[tracing::instrument(name = "api.submit_checkout", skip(self, payload), err)]
    async fn submit_checkout(
        &self,
        payload: &CheckoutPayload,
    ) -> Result<CheckoutResponse, ApiError> {
        let response = self.post("/api/checkout").json(payload).send().await?;

        Ok(self.checked(response).await?.json().await?)
    }
}
