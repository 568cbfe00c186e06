use crate::paths::lock_path_for_store;
use crate::{LockConfig, PoolError, Result};
use fs2::FileExt;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static POOL_LOCK_WAIT_MS_LAST: AtomicU64 = AtomicU64::new(0);
static POOL_LOCK_WAIT_MS_MAX: AtomicU64 = AtomicU64::new(0);

pub fn pool_lock_wait_ms_last() -> u64 {
    POOL_LOCK_WAIT_MS_LAST.load(Ordering::Relaxed)
}

pub fn pool_lock_wait_ms_max() -> u64 {
    POOL_LOCK_WAIT_MS_MAX.load(Ordering::Relaxed)
}

fn update_lock_wait_ms(wait_ms: u64) {
    POOL_LOCK_WAIT_MS_LAST.store(wait_ms, Ordering::Relaxed);
    let mut current = POOL_LOCK_WAIT_MS_MAX.load(Ordering::Relaxed);
    while wait_ms > current {
        match POOL_LOCK_WAIT_MS_MAX.compare_exchange(
            current,
            wait_ms,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(next) => current = next,
        }
    }
}

/// Exclusive advisory lock over one environment's store document.
///
/// Holding the guard is what makes the read-scan-mutate-write sequence in
/// the manager safe against other worker processes. `release` reports
/// unlock failures to the caller; dropping the guard unlocks best-effort.
#[derive(Debug)]
pub(crate) struct StoreLock {
    file: Option<std::fs::File>,
}

impl StoreLock {
    /// Unlock, surfacing a failure as [`PoolError::LockRelease`].
    pub(crate) fn release(mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|err| PoolError::LockRelease(err.to_string()))?;
        }
        Ok(())
    }

    /// Unlock on a path that already carries a primary error; a failure
    /// here is logged instead of masking that error.
    pub(crate) fn release_quiet(mut self) {
        if let Some(file) = self.file.take() {
            if let Err(err) = file.unlock() {
                log::error!("failed to release pool lock: {err}");
            }
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

pub(crate) async fn acquire_store_lock(
    store_path: &Path,
    config: &LockConfig,
) -> Result<StoreLock> {
    let path = lock_path_for_store(store_path);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&path)
        .map_err(|err| PoolError::Other(format!("open pool lock {}: {err}", path.display())))?;

    let start = Instant::now();
    let mut backoff = config.first_backoff;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match file.try_lock_exclusive() {
            Ok(()) => {
                update_lock_wait_ms(start.elapsed().as_millis() as u64);
                return Ok(StoreLock { file: Some(file) });
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {}
            Err(err) => {
                return Err(PoolError::Other(format!(
                    "acquire pool lock {}: {err}",
                    path.display()
                )));
            }
        }

        if attempts > config.max_retries {
            return Err(PoolError::LockTimeout {
                waited_ms: start.elapsed().as_millis() as u64,
                attempts,
            });
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(config.max_backoff);
    }
}
