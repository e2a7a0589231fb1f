//! Collectors driven by a mock billing API with fixed JSON bodies.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use billing_core::{AccountScope, BillingError, Facet, Result};
use billing_exporter::app_state::AppState;
use billing_exporter::client::BillingApi;
use billing_exporter::collector::{build_collectors, Collector};
use billing_exporter::config;

const ACTIONS: &str = r#"{
  "total_minutes_used": 305,
  "total_paid_minutes_used": "12.5",
  "included_minutes": 3000,
  "minutes_used_breakdown": { "UBUNTU": 205, "MACOS": 10, "WINDOWS": 90 }
}"#;
const PACKAGES: &str = r#"{
  "total_gigabytes_bandwidth_used": 50,
  "total_paid_gigabytes_bandwidth_used": 40,
  "included_gigabytes_bandwidth": 10
}"#;
const SHARED_STORAGE: &str = r#"{
  "days_left_in_billing_cycle": 20,
  "estimated_paid_storage_for_month": 15,
  "estimated_storage_for_month": 40
}"#;

/// Serves the same body per facet for every account, counting calls.
struct FixedApi {
    calls: Mutex<Vec<(AccountScope, Facet)>>,
}

impl FixedApi {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BillingApi for FixedApi {
    async fn fetch(&self, scope: &AccountScope, facet: Facet) -> Result<String> {
        self.calls.lock().unwrap().push((scope.clone(), facet));
        Ok(match facet {
            Facet::Actions => ACTIONS,
            Facet::Packages => PACKAGES,
            Facet::SharedStorage => SHARED_STORAGE,
        }
        .to_string())
    }
}

/// Replays a script of responses, one per call.
struct ScriptedApi {
    script: Mutex<VecDeque<Result<String>>>,
}

#[async_trait]
impl BillingApi for ScriptedApi {
    async fn fetch(&self, _scope: &AccountScope, _facet: Facet) -> Result<String> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BillingError::Internal("script exhausted".into())))
    }
}

fn state(yaml: &str) -> AppState {
    AppState::new(config::load_from_str(yaml).unwrap()).unwrap()
}

fn org_state() -> AppState {
    state("version: 1\ngithub: { organization: acme, token: t }\n")
}

#[tokio::test]
async fn builds_three_collectors_per_scope() {
    let st = state("version: 1\ngithub: { organization: acme, user: octocat, token: t }\n");
    let collectors = build_collectors(&st, Arc::new(FixedApi::new()));

    let pairs: Vec<(String, Facet)> = collectors
        .iter()
        .map(|c| (c.scope().to_string(), c.facet()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("orgs/acme".to_string(), Facet::Actions),
            ("orgs/acme".to_string(), Facet::Packages),
            ("orgs/acme".to_string(), Facet::SharedStorage),
            ("users/octocat".to_string(), Facet::Actions),
            ("users/octocat".to_string(), Facet::Packages),
            ("users/octocat".to_string(), Facet::SharedStorage),
        ]
    );
}

#[tokio::test]
async fn gauges_hold_exact_decoded_values() {
    let st = state("version: 1\ngithub: { organization: acme, user: octocat, token: t }\n");
    let api = Arc::new(FixedApi::new());

    for c in build_collectors(&st, api.clone()) {
        c.poll_once().await.unwrap();
    }
    assert_eq!(api.calls.lock().unwrap().len(), 6);

    let m = st.metrics();
    for owner in ["acme", "octocat"] {
        let by_owner = [("owner", owner)];
        assert_eq!(m.total_minutes_used.get(&by_owner), Some(305.0));
        assert_eq!(m.total_paid_minutes_used.get(&by_owner), Some(12.5));
        assert_eq!(m.included_minutes.get(&by_owner), Some(3000.0));
        assert_eq!(m.total_gigabytes_bandwidth_used.get(&by_owner), Some(50.0));
        assert_eq!(m.total_paid_gigabytes_bandwidth_used.get(&by_owner), Some(40.0));
        assert_eq!(m.included_gigabytes_bandwidth.get(&by_owner), Some(10.0));
        assert_eq!(m.days_left_in_billing_cycle.get(&by_owner), Some(20.0));
        assert_eq!(m.estimated_paid_storage_for_month.get(&by_owner), Some(15.0));
        assert_eq!(m.estimated_storage_for_month.get(&by_owner), Some(40.0));

        let os = |os: &str| m.minutes_used_breakdown.get(&[("owner", owner), ("os", os)]);
        assert_eq!(os("ubuntu"), Some(205.0));
        assert_eq!(os("macos"), Some(10.0));
        assert_eq!(os("windows"), Some(90.0));
    }
    assert!(st.is_ready());
}

#[tokio::test]
async fn readiness_waits_for_every_collector() {
    let st = org_state();
    let collectors = build_collectors(&st, Arc::new(FixedApi::new()));
    assert!(!st.is_ready());

    collectors[0].poll_once().await.unwrap();
    collectors[1].poll_once().await.unwrap();
    assert!(!st.is_ready());

    collectors[2].poll_once().await.unwrap();
    assert!(st.is_ready());
}

#[tokio::test]
async fn malformed_json_stops_the_loop() {
    let st = org_state();
    let api = Arc::new(ScriptedApi {
        script: Mutex::new(VecDeque::from([Ok("{\"total_minutes_used\": ".to_string())])),
    });
    let c = Collector::new(
        st.clone(),
        api,
        AccountScope::Organization("acme".into()),
        Facet::Actions,
        Duration::from_secs(1),
    );

    let err = c.run().await.unwrap_err();
    assert_eq!(err.kind().as_str(), "DECODE");
    assert_eq!(st.metrics().total_minutes_used.get(&[("owner", "acme")]), None);
    assert!(!st.is_ready());
}

#[tokio::test]
async fn loop_repolls_until_first_error() {
    let st = org_state();
    let api = Arc::new(ScriptedApi {
        script: Mutex::new(VecDeque::from([
            Ok(r#"{"total_gigabytes_bandwidth_used": 1}"#.to_string()),
            Ok(r#"{"total_gigabytes_bandwidth_used": 2}"#.to_string()),
            Err(BillingError::Status {
                status: 502,
                url: "http://billing/orgs/acme/settings/billing/packages".into(),
            }),
        ])),
    });
    let c = Collector::new(
        st.clone(),
        api,
        AccountScope::Organization("acme".into()),
        Facet::Packages,
        Duration::from_millis(10),
    );

    let err = c.run().await.unwrap_err();
    assert_eq!(err.kind().as_str(), "STATUS");
    // Values from the last successful poll stay published.
    assert_eq!(
        st.metrics().total_gigabytes_bandwidth_used.get(&[("owner", "acme")]),
        Some(2.0)
    );
}
