use std::path::{Path, PathBuf};

/// Default directory for store documents, relative to the caller's
/// working directory.
pub const POOL_DIR_NAME: &str = ".testpool";

#[must_use]
pub fn store_path_for_environment(data_dir: &Path, environment: &str) -> PathBuf {
    data_dir.join(format!("testdata-{environment}.json"))
}

/// Lock sidecar next to the store document. The lock file is separate from
/// the document so the document itself can be atomically replaced while
/// the lock is held.
#[must_use]
pub fn lock_path_for_store(store_path: &Path) -> PathBuf {
    store_path.with_extension("lock")
}
