use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pool key for user credential fixtures.
pub const USERS: &str = "users";
/// Pool key for product fixtures.
pub const PRODUCTS: &str = "products";
/// Pool key for prepared order fixtures.
pub const ORDERS: &str = "orders";

/// Lifecycle state of a single fixture within its pool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FixtureStatus {
    Available,
    InUse,
}

/// One reusable fixture row.
///
/// `holder` and `acquired_at_unix_ms` are set together when the record is
/// handed out and cleared together when it comes back; both are absent
/// exactly when the record is available.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureRecord {
    pub id: String,
    pub status: FixtureStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquired_at_unix_ms: Option<u64>,
    /// Role-specific fields (username/password for users, name/price/sku
    /// for products), kept inline in the persisted document.
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl FixtureRecord {
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == FixtureStatus::Available
    }

    /// String attribute lookup, for display surfaces.
    #[must_use]
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|value| value.as_str())
    }

    pub(crate) fn mark_in_use(&mut self, holder: &str, now_unix_ms: u64) {
        self.status = FixtureStatus::InUse;
        self.holder = Some(holder.to_string());
        self.acquired_at_unix_ms = Some(now_unix_ms);
    }

    pub(crate) fn mark_available(&mut self) {
        self.status = FixtureStatus::Available;
        self.holder = None;
        self.acquired_at_unix_ms = None;
    }
}

/// The whole persisted document for one environment. Record order within a
/// pool is the acquisition scan order and is preserved across rewrites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolStore {
    pub environment: String,
    pub environment_name: String,
    pub base_url: String,
    pub api_url: String,
    pub pools: BTreeMap<String, Vec<FixtureRecord>>,
}

/// Point-in-time availability aggregate for one fixture type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeStatus {
    pub total: usize,
    pub available: usize,
    pub in_use: usize,
    pub records: Vec<FixtureRecord>,
}

impl PoolStore {
    #[must_use]
    pub fn status_by_type(&self) -> BTreeMap<String, TypeStatus> {
        self.pools
            .iter()
            .map(|(fixture_type, records)| {
                let available = records.iter().filter(|r| r.is_available()).count();
                (
                    fixture_type.clone(),
                    TypeStatus {
                        total: records.len(),
                        available,
                        in_use: records.len() - available,
                        records: records.clone(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, status: FixtureStatus) -> FixtureRecord {
        let mut attributes = serde_json::Map::new();
        attributes.insert("username".into(), serde_json::json!("alice"));
        FixtureRecord {
            id: id.to_string(),
            status,
            holder: None,
            acquired_at_unix_ms: None,
            attributes,
        }
    }

    #[test]
    fn status_serializes_to_kebab_case() {
        let json = serde_json::to_value(FixtureStatus::InUse).expect("serialize");
        assert_eq!(json, serde_json::json!("in-use"));
        let json = serde_json::to_value(FixtureStatus::Available).expect("serialize");
        assert_eq!(json, serde_json::json!("available"));
    }

    #[test]
    fn record_attributes_stay_inline() {
        let json = serde_json::to_value(record("u1", FixtureStatus::Available)).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "id": "u1",
                "status": "available",
                "username": "alice",
            })
        );
    }

    #[test]
    fn in_use_record_round_trips_holder_and_timestamp() {
        let mut rec = record("u1", FixtureStatus::Available);
        rec.mark_in_use("worker-1", 1234);
        let json = serde_json::to_string(&rec).expect("serialize");
        let back: FixtureRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.holder.as_deref(), Some("worker-1"));
        assert_eq!(back.acquired_at_unix_ms, Some(1234));
        assert_eq!(back.attribute_str("username"), Some("alice"));
    }

    #[test]
    fn mark_available_clears_holder_and_timestamp() {
        let mut rec = record("u1", FixtureStatus::Available);
        rec.mark_in_use("worker-1", 1234);
        rec.mark_available();
        assert_eq!(rec, record("u1", FixtureStatus::Available));
    }

    #[test]
    fn status_by_type_counts_each_pool_independently() {
        let mut pools = BTreeMap::new();
        pools.insert(
            USERS.to_string(),
            vec![
                record("u1", FixtureStatus::InUse),
                record("u2", FixtureStatus::Available),
            ],
        );
        pools.insert(
            PRODUCTS.to_string(),
            vec![record("p1", FixtureStatus::Available)],
        );
        let store = PoolStore {
            environment: "qa".into(),
            environment_name: "QA".into(),
            base_url: "https://qa.example.com".into(),
            api_url: "https://qa-api.example.com".into(),
            pools,
        };

        let status = store.status_by_type();
        assert_eq!(status[USERS].total, 2);
        assert_eq!(status[USERS].available, 1);
        assert_eq!(status[USERS].in_use, 1);
        assert_eq!(status[PRODUCTS].available, 1);
        assert_eq!(status[PRODUCTS].in_use, 0);
    }
}
