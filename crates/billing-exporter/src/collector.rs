//! Poll-decode-publish loops.
//!
//! One `Collector` per (account scope, facet). Each loop fetches, decodes,
//! sets gauges, sleeps, and repeats. There is no retry: the first error
//! ends the loop and is returned to the caller, which stops the process.

use std::sync::Arc;
use std::time::Duration;

use billing_core::usage::{decode_actions, decode_packages, decode_shared_storage};
use billing_core::{AccountScope, Facet, Result};

use crate::app_state::AppState;
use crate::client::BillingApi;

pub struct Collector {
    state: AppState,
    api: Arc<dyn BillingApi>,
    scope: AccountScope,
    facet: Facet,
    interval: Duration,
}

impl Collector {
    pub fn new(
        state: AppState,
        api: Arc<dyn BillingApi>,
        scope: AccountScope,
        facet: Facet,
        interval: Duration,
    ) -> Self {
        Self {
            state,
            api,
            scope,
            facet,
            interval,
        }
    }

    pub fn scope(&self) -> &AccountScope {
        &self.scope
    }

    pub fn facet(&self) -> Facet {
        self.facet
    }

    /// Fetch once and publish into the gauge registry.
    pub async fn poll_once(&self) -> Result<()> {
        let body = self.api.fetch(&self.scope, self.facet).await?;
        let owner = self.scope.owner();
        let metrics = self.state.metrics();

        match self.facet {
            Facet::Actions => metrics.publish_actions(owner, &decode_actions(&body)?),
            Facet::Packages => metrics.publish_packages(owner, &decode_packages(&body)?),
            Facet::SharedStorage => {
                metrics.publish_shared_storage(owner, &decode_shared_storage(&body)?)
            }
        }

        self.state.mark_polled(&self.scope, self.facet);
        tracing::debug!(owner, facet = %self.facet, "billing gauges updated");
        Ok(())
    }

    /// Poll forever. Only returns on error.
    pub async fn run(self) -> Result<()> {
        loop {
            self.poll_once().await?;
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// One collector per configured scope for each of the three facets.
pub fn build_collectors(state: &AppState, api: Arc<dyn BillingApi>) -> Vec<Collector> {
    let github = &state.cfg().github;
    let interval = github.refresh();

    github
        .scopes()
        .into_iter()
        .flat_map(|scope| Facet::ALL.into_iter().map(move |facet| (scope.clone(), facet)))
        .map(|(scope, facet)| {
            Collector::new(state.clone(), Arc::clone(&api), scope, facet, interval)
        })
        .collect()
}
