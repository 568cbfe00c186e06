use thiserror::Error;

pub type Result<T> = std::result::Result<T, PoolError>;

#[derive(Error, Debug)]
pub enum PoolError {
    /// Every record of the named type is in use. Recoverable: retry after
    /// other workers release, or lower worker concurrency.
    #[error("no available {0} in the pool")]
    PoolExhausted(String),

    /// The store lock stayed contended past the retry budget. Recoverable:
    /// retry the whole operation.
    #[error("timed out waiting for pool lock after {waited_ms}ms ({attempts} attempts)")]
    LockTimeout { waited_ms: u64, attempts: u32 },

    /// Unlocking failed after a successful mutation. The store was written
    /// but the lock file may still look held to other processes.
    #[error("failed to release pool lock: {0}")]
    LockRelease(String),

    #[error(transparent)]
    UnknownEnvironment(#[from] testpool_environments::CatalogError),

    #[error("unknown fixture type: {0}")]
    UnknownType(String),

    /// The persisted document no longer parses. Surfaced loudly and never
    /// repaired in place; a prior write must have failed.
    #[error("pool store corrupt at {path}: {source}")]
    StoreCorrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
