use crate::paths::store_path_for_environment;
use crate::store::{read_or_seed, write_store};
use crate::store_lock::acquire_store_lock;
use crate::types::{FixtureRecord, TypeStatus};
use crate::{LockConfig, PoolError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use testpool_environments::EnvironmentConfig;

/// Hands out exclusive fixtures from one environment's persisted pool.
///
/// Every mutating operation takes the cross-process store lock, re-reads
/// the document fresh, applies the change in memory, writes the whole
/// document back, and unlocks. Workers in other processes contend on the
/// same lock file, so at most one critical section runs per store at a
/// time.
///
/// A handle is scoped to a single environment for its whole lifetime;
/// iterate environments by constructing a fresh handle per environment.
#[derive(Debug)]
pub struct FixturePool {
    env: &'static EnvironmentConfig,
    store_path: PathBuf,
    lock_config: LockConfig,
}

impl FixturePool {
    /// Open the pool for `environment`, persisting under `data_dir`.
    pub fn new(environment: &str, data_dir: &Path) -> Result<Self> {
        Ok(Self::for_config(
            testpool_environments::environment(environment)?,
            data_dir,
        ))
    }

    pub fn for_config(env: &'static EnvironmentConfig, data_dir: &Path) -> Self {
        Self {
            env,
            store_path: store_path_for_environment(data_dir, &env.key),
            lock_config: LockConfig::default(),
        }
    }

    #[must_use]
    pub fn with_lock_config(mut self, lock_config: LockConfig) -> Self {
        self.lock_config = lock_config;
        self
    }

    #[must_use]
    pub fn environment(&self) -> &EnvironmentConfig {
        self.env
    }

    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Take the first available fixture of `fixture_type`, marking it held
    /// by `holder`. Returns a copy of the record; the store keeps the
    /// authoritative row.
    pub async fn acquire(&self, fixture_type: &str, holder: &str) -> Result<FixtureRecord> {
        let lock = acquire_store_lock(&self.store_path, &self.lock_config).await?;

        match self.acquire_locked(fixture_type, holder).await {
            Ok(record) => {
                lock.release()?;
                log::info!(
                    "[{}] acquired {fixture_type}: {} for {holder}",
                    self.env.key.to_uppercase(),
                    record.id
                );
                Ok(record)
            }
            Err(err) => {
                lock.release_quiet();
                log::warn!("failed to acquire {fixture_type}: {err}");
                Err(err)
            }
        }
    }

    async fn acquire_locked(&self, fixture_type: &str, holder: &str) -> Result<FixtureRecord> {
        let mut store = read_or_seed(&self.store_path, self.env).await?;
        let records = store
            .pools
            .get_mut(fixture_type)
            .ok_or_else(|| PoolError::UnknownType(fixture_type.to_string()))?;

        // First available wins, in stored order. Deterministic hand-out
        // keeps parallel suites reproducible.
        let record = records
            .iter_mut()
            .find(|record| record.is_available())
            .ok_or_else(|| PoolError::PoolExhausted(fixture_type.to_string()))?;

        record.mark_in_use(holder, unix_now_ms());
        let selected = record.clone();
        write_store(&self.store_path, &store).await?;
        Ok(selected)
    }

    /// Return a fixture to its pool. Unknown ids are ignored, so releasing
    /// twice (or releasing something never acquired) is safe.
    pub async fn release(&self, id: &str, fixture_type: &str) -> Result<()> {
        let lock = acquire_store_lock(&self.store_path, &self.lock_config).await?;

        match self.release_locked(id, fixture_type).await {
            Ok(released) => {
                lock.release()?;
                if released {
                    log::info!(
                        "[{}] released {fixture_type}: {id}",
                        self.env.key.to_uppercase()
                    );
                }
                Ok(())
            }
            Err(err) => {
                lock.release_quiet();
                log::warn!("failed to release {fixture_type} {id}: {err}");
                Err(err)
            }
        }
    }

    async fn release_locked(&self, id: &str, fixture_type: &str) -> Result<bool> {
        let mut store = read_or_seed(&self.store_path, self.env).await?;
        let records = store
            .pools
            .get_mut(fixture_type)
            .ok_or_else(|| PoolError::UnknownType(fixture_type.to_string()))?;

        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            return Ok(false);
        };
        record.mark_available();
        write_store(&self.store_path, &store).await?;
        Ok(true)
    }

    /// Point-in-time availability aggregate. Runs without the lock: the
    /// result may race a concurrent acquire and is advisory only, never a
    /// basis for acquisition decisions.
    pub async fn status(&self) -> Result<BTreeMap<String, TypeStatus>> {
        let store = read_or_seed(&self.store_path, self.env).await?;
        Ok(store.status_by_type())
    }

    /// Force every record in every pool back to available. Administrative
    /// recovery for workers that crashed while holding fixtures; the
    /// acquire/release path never calls this.
    pub async fn cleanup(&self) -> Result<()> {
        let lock = acquire_store_lock(&self.store_path, &self.lock_config).await?;

        match self.cleanup_locked().await {
            Ok(()) => {
                lock.release()?;
                log::info!("[{}] data pool cleaned up", self.env.key.to_uppercase());
                Ok(())
            }
            Err(err) => {
                lock.release_quiet();
                log::warn!("failed to clean up pool: {err}");
                Err(err)
            }
        }
    }

    async fn cleanup_locked(&self) -> Result<()> {
        let mut store = read_or_seed(&self.store_path, self.env).await?;
        for records in store.pools.values_mut() {
            for record in records.iter_mut() {
                record.mark_available();
            }
        }
        write_store(&self.store_path, &store).await?;
        Ok(())
    }
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|dur| u64::try_from(dur.as_millis()).ok())
        .unwrap_or(0)
}
