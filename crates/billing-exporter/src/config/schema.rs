use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use billing_core::{AccountScope, BillingError, Result};

/// Environment variable consulted when `github.token` is not set.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub exporter: ExporterSection,

    pub github: GithubSection,
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(BillingError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.exporter.validate()?;
        self.github.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            BillingError::Config(format!(
                "exporter.listen must be a valid socket address, got {:?}",
                self.listen
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubSection {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub organization: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl GithubSection {
    pub fn validate(&self) -> Result<()> {
        if self.organization.is_none() && self.user.is_none() {
            return Err(BillingError::Config(
                "github: at least one of organization or user must be set".into(),
            ));
        }
        for (field, name) in [("organization", &self.organization), ("user", &self.user)] {
            if let Some(name) = name {
                if name.trim().is_empty() || name.contains('/') {
                    return Err(BillingError::Config(format!(
                        "github.{field} must be a bare account name, got {name:?}"
                    )));
                }
            }
        }
        if !(1..=86_400).contains(&self.refresh_secs) {
            return Err(BillingError::Config(
                "github.refresh_secs must be between 1 and 86400".into(),
            ));
        }
        if !(self.api_base.starts_with("https://") || self.api_base.starts_with("http://")) {
            return Err(BillingError::Config(format!(
                "github.api_base must be an http(s) url, got {:?}",
                self.api_base
            )));
        }
        Ok(())
    }

    /// Configured account scopes, organization first.
    pub fn scopes(&self) -> Vec<AccountScope> {
        let mut out = Vec::with_capacity(2);
        if let Some(org) = &self.organization {
            out.push(AccountScope::Organization(org.clone()));
        }
        if let Some(user) = &self.user {
            out.push(AccountScope::User(user.clone()));
        }
        out
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    /// Token from config, else from `GITHUB_TOKEN`.
    pub fn resolve_token(&self) -> Result<String> {
        self.resolve_token_with(|key| std::env::var(key).ok())
    }

    pub fn resolve_token_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<String> {
        let present = |t: &String| !t.trim().is_empty();
        self.token
            .clone()
            .filter(present)
            .or_else(|| env(TOKEN_ENV).filter(present))
            .ok_or_else(|| {
                BillingError::Config(format!("no API token: set github.token or {TOKEN_ENV}"))
            })
    }
}

fn default_listen() -> String {
    "0.0.0.0:9101".into()
}
fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_refresh_secs() -> u64 {
    60
}
