use crate::types::{FixtureRecord, FixtureStatus, PoolStore, ORDERS, PRODUCTS, USERS};
use crate::{PoolError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use testpool_environments::EnvironmentConfig;

/// Read the persisted store, or derive the initial one from the catalog
/// when it has not been materialized yet. Callers inside a critical
/// section get a fresh read of whatever another process last wrote.
pub(crate) async fn read_or_seed(store_path: &Path, env: &EnvironmentConfig) -> Result<PoolStore> {
    match tokio::fs::read(store_path).await {
        Ok(bytes) => {
            serde_json::from_slice(&bytes).map_err(|source| PoolError::StoreCorrupt {
                path: store_path.display().to_string(),
                source,
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("seeding {} data pool from catalog", env.key);
            seed_store(env)
        }
        Err(err) => Err(err.into()),
    }
}

/// Persist the whole document. The write goes to a temp sibling first and
/// is renamed into place, so a failed write leaves the old document intact.
pub(crate) async fn write_store(store_path: &Path, store: &PoolStore) -> Result<()> {
    if let Some(parent) = store_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(store)?;
    let tmp = store_path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, store_path).await?;
    Ok(())
}

pub(crate) fn seed_store(env: &EnvironmentConfig) -> Result<PoolStore> {
    let mut pools = BTreeMap::new();
    pools.insert(USERS.to_string(), seed_records(&env.users)?);
    pools.insert(PRODUCTS.to_string(), seed_records(&env.products)?);
    pools.insert(ORDERS.to_string(), seed_records(&env.orders)?);
    Ok(PoolStore {
        environment: env.key.clone(),
        environment_name: env.name.clone(),
        base_url: env.base_url.clone(),
        api_url: env.api_url.clone(),
        pools,
    })
}

fn seed_records<T: Serialize>(seeds: &[T]) -> Result<Vec<FixtureRecord>> {
    seeds
        .iter()
        .map(|seed| {
            let mut object = match serde_json::to_value(seed)? {
                serde_json::Value::Object(object) => object,
                other => {
                    return Err(PoolError::Other(format!(
                        "fixture seed did not serialize to an object: {other}"
                    )))
                }
            };
            let id = match object.remove("id") {
                Some(serde_json::Value::String(id)) => id,
                _ => {
                    return Err(PoolError::Other(
                        "fixture seed is missing a string id".to_string(),
                    ))
                }
            };
            Ok(FixtureRecord {
                id,
                status: FixtureStatus::Available,
                holder: None,
                acquired_at_unix_ms: None,
                attributes: object,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn qa() -> &'static EnvironmentConfig {
        testpool_environments::environment("qa").expect("qa registered")
    }

    #[test]
    fn seeded_store_carries_environment_metadata() {
        let store = seed_store(qa()).expect("seed");
        assert_eq!(store.environment, "qa");
        assert_eq!(store.environment_name, "QA");
        assert_eq!(store.base_url, "https://qa.saucedemo.com");
        assert_eq!(store.api_url, "https://qa-api.saucedemo.com");
    }

    #[test]
    fn seeded_records_keep_catalog_order_and_attributes() {
        let store = seed_store(qa()).expect("seed");
        let users = &store.pools[USERS];
        assert_eq!(users.len(), 5);
        assert_eq!(users[0].id, "qa-user1");
        assert_eq!(users[0].attribute_str("username"), Some("qa_standard_user"));
        assert_eq!(users[0].attribute_str("role"), Some("standard"));
        assert!(users.iter().all(FixtureRecord::is_available));

        let products = &store.pools[PRODUCTS];
        assert_eq!(products[2].attribute_str("sku"), Some("QA-TS-003"));
        assert!(store.pools[ORDERS].is_empty());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("testdata-qa.json");

        let store = seed_store(qa()).expect("seed");
        write_store(&path, &store).await.expect("write");

        let back = read_or_seed(&path, qa()).await.expect("read");
        assert_eq!(back, store);
    }

    #[tokio::test]
    async fn missing_file_seeds_without_writing() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("testdata-qa.json");

        let store = read_or_seed(&path, qa()).await.expect("seed");
        assert_eq!(store.pools[USERS].len(), 5);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn corrupt_document_surfaces_and_stays_untouched() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("testdata-qa.json");
        tokio::fs::write(&path, b"{not json")
            .await
            .expect("write garbage");

        let err = read_or_seed(&path, qa()).await.unwrap_err();
        assert!(matches!(err, PoolError::StoreCorrupt { .. }));

        let bytes = tokio::fs::read(&path).await.expect("reread");
        assert_eq!(bytes, b"{not json");
    }

    #[test]
    fn persisted_document_is_human_readable() {
        let store = seed_store(qa()).expect("seed");
        let text = serde_json::to_string_pretty(&store).expect("serialize");
        assert!(text.contains("\"status\": \"available\""));
        assert!(text.contains("\"username\": \"qa_standard_user\""));
    }
}
