//! # Testpool Environments
//!
//! Static catalog of test environments and their seed fixtures.
//!
//! Each environment (qa, dev, prod) carries its own endpoints and its own
//! fixture rows; the pool crate seeds a fresh store from this catalog the
//! first time an environment is used. The catalog itself is read-only.

mod catalog;
mod error;
mod types;

pub use catalog::{
    environment, environment_from_env, environment_keys, DEFAULT_ENVIRONMENT, ENV_VAR,
};
pub use error::{CatalogError, Result};
pub use types::{EnvironmentConfig, TestOrder, TestProduct, TestUser, UserRole};
