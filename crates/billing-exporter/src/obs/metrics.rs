//! Gauge registry for the exporter.
//!
//! Gauges carry dynamic labels backed by `DashMap`. Labels are flattened into
//! sorted key vectors to keep deterministic ordering. Values are `f64` stored
//! as raw bits in an `AtomicU64`, so concurrent collectors never lock each
//! other out of the registry.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use billing_core::usage::{ActionsUsage, PackagesUsage, SharedStorageUsage};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

pub struct GaugeVec {
    name: &'static str,
    help: &'static str,
    map: DashMap<LabelKey, AtomicU64>,
}

impl GaugeVec {
    pub fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            map: DashMap::new(),
        }
    }

    /// Overwrite the value for a label set.
    pub fn set(&self, labels: &[(&str, &str)], v: f64) {
        let gauge = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        gauge.store(v.to_bits(), Ordering::Relaxed);
    }

    /// Current value for a label set, if it was ever set.
    pub fn get(&self, labels: &[(&str, &str)]) -> Option<f64> {
        self.map
            .get(&label_key(labels))
            .map(|g| f64::from_bits(g.load(Ordering::Relaxed)))
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", self.name, self.help);
        let _ = writeln!(out, "# TYPE {} gauge", self.name);

        let mut lines: Vec<String> = self
            .map
            .iter()
            .map(|r| {
                let val = f64::from_bits(r.value().load(Ordering::Relaxed));
                let label_str = r
                    .key()
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}{{{}}} {}", self.name, label_str, val)
            })
            .collect();
        lines.sort();
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
    }
}

/// Every gauge family the exporter publishes.
pub struct BillingMetrics {
    pub total_minutes_used: GaugeVec,
    pub total_paid_minutes_used: GaugeVec,
    pub included_minutes: GaugeVec,
    pub minutes_used_breakdown: GaugeVec,

    pub total_gigabytes_bandwidth_used: GaugeVec,
    pub total_paid_gigabytes_bandwidth_used: GaugeVec,
    pub included_gigabytes_bandwidth: GaugeVec,

    pub days_left_in_billing_cycle: GaugeVec,
    pub estimated_paid_storage_for_month: GaugeVec,
    pub estimated_storage_for_month: GaugeVec,
}

impl Default for BillingMetrics {
    fn default() -> Self {
        Self {
            total_minutes_used: GaugeVec::new(
                "total_minutes_used",
                "github actions total minutes used",
            ),
            total_paid_minutes_used: GaugeVec::new(
                "total_paid_minutes_used",
                "github actions total paid minutes used",
            ),
            included_minutes: GaugeVec::new(
                "included_minutes",
                "github actions included minutes",
            ),
            minutes_used_breakdown: GaugeVec::new(
                "minutes_used_breakdown",
                "github actions minutes used per runner os",
            ),
            total_gigabytes_bandwidth_used: GaugeVec::new(
                "total_gigabytes_bandwidth_used",
                "github packages total gigabytes bandwidth used",
            ),
            total_paid_gigabytes_bandwidth_used: GaugeVec::new(
                "total_paid_gigabytes_bandwidth_used",
                "github packages total paid gigabytes bandwidth used",
            ),
            included_gigabytes_bandwidth: GaugeVec::new(
                "included_gigabytes_bandwidth",
                "github packages included gigabytes bandwidth",
            ),
            days_left_in_billing_cycle: GaugeVec::new(
                "days_left_in_billing_cycle",
                "github shared storage days left in billing cycle",
            ),
            estimated_paid_storage_for_month: GaugeVec::new(
                "estimated_paid_storage_for_month",
                "github shared storage estimated paid storage for month",
            ),
            estimated_storage_for_month: GaugeVec::new(
                "estimated_storage_for_month",
                "github shared storage estimated storage for month",
            ),
        }
    }
}

impl BillingMetrics {
    pub fn publish_actions(&self, owner: &str, u: &ActionsUsage) {
        let by_owner = [("owner", owner)];
        self.total_minutes_used.set(&by_owner, u.total_minutes_used);
        self.total_paid_minutes_used.set(&by_owner, u.total_paid_minutes_used);
        self.included_minutes.set(&by_owner, u.included_minutes);
        for (os, minutes) in u.minutes_used_breakdown.categories() {
            self.minutes_used_breakdown
                .set(&[("owner", owner), ("os", os.as_str())], minutes);
        }
    }

    pub fn publish_packages(&self, owner: &str, u: &PackagesUsage) {
        let by_owner = [("owner", owner)];
        self.total_gigabytes_bandwidth_used
            .set(&by_owner, u.total_gigabytes_bandwidth_used);
        self.total_paid_gigabytes_bandwidth_used
            .set(&by_owner, u.total_paid_gigabytes_bandwidth_used);
        self.included_gigabytes_bandwidth
            .set(&by_owner, u.included_gigabytes_bandwidth);
    }

    pub fn publish_shared_storage(&self, owner: &str, u: &SharedStorageUsage) {
        let by_owner = [("owner", owner)];
        self.days_left_in_billing_cycle
            .set(&by_owner, u.days_left_in_billing_cycle);
        self.estimated_paid_storage_for_month
            .set(&by_owner, u.estimated_paid_storage_for_month);
        self.estimated_storage_for_month
            .set(&by_owner, u.estimated_storage_for_month);
    }

    fn families(&self) -> [&GaugeVec; 10] {
        [
            &self.total_minutes_used,
            &self.total_paid_minutes_used,
            &self.included_minutes,
            &self.minutes_used_breakdown,
            &self.total_gigabytes_bandwidth_used,
            &self.total_paid_gigabytes_bandwidth_used,
            &self.included_gigabytes_bandwidth,
            &self.days_left_in_billing_cycle,
            &self.estimated_paid_storage_for_month,
            &self.estimated_storage_for_month,
        ]
    }

    /// Render all gauge families.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for family in self.families() {
            family.render(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::usage::MinutesBreakdown;

    #[test]
    fn set_overwrites_instead_of_accumulating() {
        let g = GaugeVec::new("g", "test gauge");
        g.set(&[("owner", "acme")], 10.0);
        g.set(&[("owner", "acme")], 3.5);
        assert_eq!(g.get(&[("owner", "acme")]), Some(3.5));
        assert_eq!(g.get(&[("owner", "other")]), None);
    }

    #[test]
    fn label_order_does_not_matter() {
        let g = GaugeVec::new("g", "test gauge");
        g.set(&[("os", "macos"), ("owner", "acme")], 1.0);
        assert_eq!(g.get(&[("owner", "acme"), ("os", "macos")]), Some(1.0));
    }

    #[test]
    fn render_is_sorted_and_escaped() {
        let g = GaugeVec::new("g", "test gauge");
        g.set(&[("owner", "zeta")], 2.0);
        g.set(&[("owner", "a\"b")], 0.25);

        let mut out = String::new();
        g.render(&mut out);
        assert_eq!(
            out,
            "# HELP g test gauge\n# TYPE g gauge\ng{owner=\"a\\\"b\"} 0.25\ng{owner=\"zeta\"} 2\n"
        );
    }

    #[test]
    fn publish_actions_labels_by_owner_and_os() {
        let m = BillingMetrics::default();
        let u = ActionsUsage {
            total_minutes_used: 305.0,
            total_paid_minutes_used: 5.0,
            included_minutes: 3000.0,
            minutes_used_breakdown: MinutesBreakdown::from_pairs([
                ("UBUNTU", 205.0),
                ("WINDOWS", 100.0),
            ]),
        };
        m.publish_actions("acme", &u);

        assert_eq!(m.total_minutes_used.get(&[("owner", "acme")]), Some(305.0));
        assert_eq!(m.total_paid_minutes_used.get(&[("owner", "acme")]), Some(5.0));
        let os = |os: &str| m.minutes_used_breakdown.get(&[("owner", "acme"), ("os", os)]);
        assert_eq!(os("ubuntu"), Some(205.0));
        assert_eq!(os("macos"), Some(0.0));
        assert_eq!(os("windows"), Some(100.0));

        let text = m.render();
        assert!(text.contains("minutes_used_breakdown{os=\"ubuntu\",owner=\"acme\"} 205\n"));
        assert!(text.contains("# TYPE estimated_storage_for_month gauge\n"));
    }
}
