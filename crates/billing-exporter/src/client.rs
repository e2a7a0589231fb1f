//! Billing API client.
//!
//! `BillingApi` is the seam between the collectors and the network: it hands
//! back raw response bodies and leaves decoding to `billing_core::usage`.

use async_trait::async_trait;

use billing_core::{endpoint, AccountScope, BillingError, Facet, Result};

use crate::config::GithubSection;

const USER_AGENT: &str = concat!("billing-exporter/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";

/// Source of billing response bodies.
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Fetch one facet for one account. Non-2xx responses are errors.
    async fn fetch(&self, scope: &AccountScope, facet: Facet) -> Result<String>;
}

/// GitHub billing API over HTTPS with bearer-token auth.
///
/// No request timeout is configured; pacing comes from the collectors' sleep.
pub struct HttpBillingApi {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl HttpBillingApi {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BillingError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        })
    }

    /// Build from the `github` config section, resolving the token.
    pub fn from_config(cfg: &GithubSection) -> Result<Self> {
        Self::new(cfg.api_base.clone(), cfg.resolve_token()?)
    }
}

#[async_trait]
impl BillingApi for HttpBillingApi {
    async fn fetch(&self, scope: &AccountScope, facet: Facet) -> Result<String> {
        let url = endpoint(&self.api_base, scope, facet);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await
            .map_err(|e| BillingError::Transport(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "billing api rejected request");
            return Err(BillingError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .text()
            .await
            .map_err(|e| BillingError::Transport(format!("read body of {url}: {e}")))
    }
}
