//! Shared application state for the exporter.
//!
//! Holds the validated config, the gauge registry written by every
//! collector, and the set of collectors that have published at least once
//! (for `/readyz`).

use std::sync::Arc;

use dashmap::DashSet;

use billing_core::{AccountScope, Facet, Result};

use crate::config::ExporterConfig;
use crate::obs::metrics::BillingMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ExporterConfig,
    metrics: BillingMetrics,
    polled: DashSet<(AccountScope, Facet)>,
    expected: usize,
}

impl AppState {
    /// Build application state. Re-validates so callers holding a
    /// hand-built config cannot skip the checks the loader runs.
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        cfg.validate()?;
        let expected = cfg.github.scopes().len() * Facet::ALL.len();
        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                metrics: BillingMetrics::default(),
                polled: DashSet::new(),
                expected,
            }),
        })
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> &BillingMetrics {
        &self.inner.metrics
    }

    /// Record that a collector has published its first values.
    pub fn mark_polled(&self, scope: &AccountScope, facet: Facet) {
        if self.inner.polled.insert((scope.clone(), facet)) {
            tracing::info!(
                owner = scope.owner(),
                %facet,
                polled = self.inner.polled.len(),
                expected = self.inner.expected,
                "first billing values published"
            );
        }
    }

    /// True once every configured collector has published at least once.
    pub fn is_ready(&self) -> bool {
        self.inner.polled.len() >= self.inner.expected
    }
}
