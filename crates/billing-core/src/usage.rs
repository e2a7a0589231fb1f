//! Usage records returned by the billing endpoints.
//!
//! Bodies are flat JSON objects. Absent or `null` keys read as zero and
//! unknown keys are ignored, since the API grows new fields over time.
//! Anything that is not a JSON object, or a known key holding the wrong
//! type, is a decode error.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{BillingError, Result};
use crate::scope::Facet;

/// Runner categories the API always reports, in publish order.
const STANDARD_OS: [&str; 3] = ["UBUNTU", "MACOS", "WINDOWS"];

/// `GET .../settings/billing/actions`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActionsUsage {
    #[serde(deserialize_with = "zero_if_null")]
    pub total_minutes_used: f64,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub total_paid_minutes_used: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub included_minutes: f64,
    pub minutes_used_breakdown: MinutesBreakdown,
}

/// Minutes per runner OS, keyed by the upper-cased API name (`UBUNTU`,
/// `MACOS`, `WINDOWS`, `UBUNTU_4_CORE`, ...).
///
/// Keys match case-insensitively; when a body spells one category twice the
/// later entry wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinutesBreakdown(BTreeMap<String, f64>);

impl MinutesBreakdown {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_ascii_uppercase(), v))
                .collect(),
        )
    }

    /// `(os_label, minutes)` pairs with lower-cased labels.
    ///
    /// The standard categories come first and are always present; any extra
    /// categories follow in key order.
    pub fn categories(&self) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = STANDARD_OS
            .iter()
            .map(|os| (os.to_ascii_lowercase(), self.0.get(*os).copied().unwrap_or(0.0)))
            .collect();
        out.extend(
            self.0
                .iter()
                .filter(|(k, _)| !STANDARD_OS.contains(&k.as_str()))
                .map(|(k, v)| (k.to_ascii_lowercase(), *v)),
        );
        out
    }
}

impl<'de> Deserialize<'de> for MinutesBreakdown {
    fn deserialize<D>(de: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        de.deserialize_option(BreakdownVisitor)
    }
}

struct BreakdownVisitor;

impl<'de> Visitor<'de> for BreakdownVisitor {
    type Value = MinutesBreakdown;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of runner os to minutes, or null")
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(MinutesBreakdown::default())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(MinutesBreakdown::default())
    }

    fn visit_some<D>(self, de: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        de.deserialize_map(self)
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = BTreeMap::new();
        while let Some((k, v)) = access.next_entry::<String, Option<f64>>()? {
            map.insert(k.to_ascii_uppercase(), v.unwrap_or(0.0));
        }
        Ok(MinutesBreakdown(map))
    }
}

/// `GET .../settings/billing/packages`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PackagesUsage {
    #[serde(deserialize_with = "zero_if_null")]
    pub total_gigabytes_bandwidth_used: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub total_paid_gigabytes_bandwidth_used: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub included_gigabytes_bandwidth: f64,
}

/// `GET .../settings/billing/shared-storage`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SharedStorageUsage {
    #[serde(deserialize_with = "zero_if_null")]
    pub days_left_in_billing_cycle: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub estimated_paid_storage_for_month: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub estimated_storage_for_month: f64,
}

pub fn decode_actions(body: &str) -> Result<ActionsUsage> {
    decode(Facet::Actions, body)
}

pub fn decode_packages(body: &str) -> Result<PackagesUsage> {
    decode(Facet::Packages, body)
}

pub fn decode_shared_storage(body: &str) -> Result<SharedStorageUsage> {
    decode(Facet::SharedStorage, body)
}

fn decode<T: DeserializeOwned>(facet: Facet, body: &str) -> Result<T> {
    let fail = |reason: String| {
        tracing::debug!(%facet, %reason, "usage body rejected");
        BillingError::Decode { facet, reason }
    };

    // serde's derived structs also accept JSON arrays positionally.
    if !body.trim_start().starts_with('{') {
        return Err(fail("expected a JSON object".into()));
    }
    // Straight from the text so map entries arrive in document order.
    serde_json::from_str(body).map_err(|e| fail(e.to_string()))
}

fn zero_if_null<'de, D>(de: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(de)?.unwrap_or(0.0))
}

fn number_or_numeric_string<'de, D>(de: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(de)? {
        None => Ok(0.0),
        Some(Raw::Number(n)) => Ok(n),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {s:?}"))),
    }
}
