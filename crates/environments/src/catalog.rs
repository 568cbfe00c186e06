use crate::error::{CatalogError, Result};
use crate::types::{EnvironmentConfig, TestProduct, TestUser, UserRole};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Environment assumed when `TEST_ENV` is unset.
pub const DEFAULT_ENVIRONMENT: &str = "qa";

/// Environment variable consulted by [`environment_from_env`].
pub const ENV_VAR: &str = "TEST_ENV";

static REGISTRY: Lazy<BTreeMap<&'static str, EnvironmentConfig>> = Lazy::new(|| {
    let mut registry = BTreeMap::new();
    registry.insert("qa", qa());
    registry.insert("dev", dev());
    registry.insert("prod", prod());
    registry
});

/// Look up a registered environment by its short code.
pub fn environment(key: &str) -> Result<&'static EnvironmentConfig> {
    REGISTRY
        .get(key)
        .ok_or_else(|| CatalogError::UnknownEnvironment(key.to_string()))
}

/// Short codes of every registered environment, in stable order.
pub fn environment_keys() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

/// Resolve the environment selected for this process from `TEST_ENV`,
/// falling back to [`DEFAULT_ENVIRONMENT`]. Read once at startup; pools
/// are scoped to a single environment for their whole lifetime.
pub fn environment_from_env() -> Result<&'static EnvironmentConfig> {
    let key = std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string());
    environment(&key)
}

fn user(id: &str, username: &str, role: UserRole) -> TestUser {
    TestUser {
        id: id.to_string(),
        username: username.to_string(),
        password: "secret_sauce".to_string(),
        role,
    }
}

fn product(id: &str, name: &str, price: f64, sku: &str) -> TestProduct {
    TestProduct {
        id: id.to_string(),
        name: name.to_string(),
        price,
        sku: sku.to_string(),
    }
}

fn qa() -> EnvironmentConfig {
    EnvironmentConfig {
        key: "qa".to_string(),
        name: "QA".to_string(),
        base_url: "https://qa.saucedemo.com".to_string(),
        api_url: "https://qa-api.saucedemo.com".to_string(),
        color: "#10B981".to_string(),
        users: vec![
            user("qa-user1", "qa_standard_user", UserRole::Standard),
            user("qa-user2", "qa_problem_user", UserRole::Problem),
            user("qa-user3", "qa_performance_user", UserRole::Performance),
            user("qa-user4", "qa_error_user", UserRole::Error),
            user("qa-user5", "qa_visual_user", UserRole::Visual),
        ],
        products: vec![
            product("qa-prod1", "QA Backpack", 29.99, "QA-BP-001"),
            product("qa-prod2", "QA Bike Light", 9.99, "QA-BL-002"),
            product("qa-prod3", "QA T-Shirt", 15.99, "QA-TS-003"),
            product("qa-prod4", "QA Fleece Jacket", 49.99, "QA-FJ-004"),
            product("qa-prod5", "QA Onesie", 7.99, "QA-ON-005"),
        ],
        orders: Vec::new(),
    }
}

fn dev() -> EnvironmentConfig {
    EnvironmentConfig {
        key: "dev".to_string(),
        name: "Development".to_string(),
        base_url: "https://dev.saucedemo.com".to_string(),
        api_url: "https://dev-api.saucedemo.com".to_string(),
        color: "#F97316".to_string(),
        users: vec![
            user("dev-user1", "dev_standard_user", UserRole::Standard),
            user("dev-user2", "dev_problem_user", UserRole::Problem),
            user("dev-user3", "dev_performance_user", UserRole::Performance),
            user("dev-user4", "dev_error_user", UserRole::Error),
            user("dev-user5", "dev_visual_user", UserRole::Visual),
            user("dev-user6", "dev_admin_user", UserRole::Admin),
        ],
        products: vec![
            product("dev-prod1", "DEV Backpack", 29.99, "DEV-BP-001"),
            product("dev-prod2", "DEV Bike Light", 9.99, "DEV-BL-002"),
            product("dev-prod3", "DEV T-Shirt", 15.99, "DEV-TS-003"),
            product("dev-prod4", "DEV Fleece Jacket", 49.99, "DEV-FJ-004"),
            product("dev-prod5", "DEV Onesie", 7.99, "DEV-ON-005"),
            product("dev-prod6", "DEV Test Product", 99.99, "DEV-TP-006"),
        ],
        orders: Vec::new(),
    }
}

fn prod() -> EnvironmentConfig {
    EnvironmentConfig {
        key: "prod".to_string(),
        name: "Production".to_string(),
        base_url: "https://www.saucedemo.com".to_string(),
        api_url: "https://api.saucedemo.com".to_string(),
        color: "#8B5CF6".to_string(),
        users: vec![
            user("prod-user1", "standard_user", UserRole::Standard),
            user("prod-user2", "problem_user", UserRole::Problem),
            user("prod-user3", "performance_glitch_user", UserRole::Performance),
        ],
        products: vec![
            product("prod-prod1", "Sauce Labs Backpack", 29.99, "PROD-BP-001"),
            product("prod-prod2", "Sauce Labs Bike Light", 9.99, "PROD-BL-002"),
            product("prod-prod3", "Sauce Labs Bolt T-Shirt", 15.99, "PROD-TS-003"),
        ],
        orders: Vec::new(),
    }
}
