//! # Testpool Core
//!
//! Cross-process fixture pool for parallel test workers.
//!
//! One JSON document per environment holds every fixture and its
//! availability. Workers in independent processes coordinate through an
//! exclusive lock on a sidecar file:
//!
//! ```text
//! Worker
//!     │
//!     ├──> acquire(type, holder)
//!     │      └─> lock ─> fresh read ─> first available ─> persist ─> unlock
//!     │
//!     └──> release(id, type)
//!            └─> lock ─> fresh read ─> mark available ─> persist ─> unlock
//! ```
//!
//! The store is seeded from the environment catalog on first use and is
//! authoritative from then on. Fixtures held by crashed workers stay
//! in use until an administrator runs [`FixturePool::cleanup`].
//!
//! ## Example
//!
//! ```no_run
//! use testpool_pool::{FixturePool, USERS};
//!
//! #[tokio::main]
//! async fn main() -> testpool_pool::Result<()> {
//!     let pool = FixturePool::new("qa", std::path::Path::new(".testpool"))?;
//!     let user = pool.acquire(USERS, "worker-1").await?;
//!
//!     // ... drive the test with user ...
//!
//!     pool.release(&user.id, USERS).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod manager;
mod paths;
mod store;
mod store_lock;
mod types;

pub use config::LockConfig;
pub use error::{PoolError, Result};
pub use manager::FixturePool;
pub use paths::{lock_path_for_store, store_path_for_environment, POOL_DIR_NAME};
pub use store_lock::{pool_lock_wait_ms_last, pool_lock_wait_ms_max};
pub use types::{FixtureRecord, FixtureStatus, PoolStore, TypeStatus, ORDERS, PRODUCTS, USERS};
