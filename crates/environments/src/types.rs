use serde::{Deserialize, Serialize};

/// Account role a seeded user exercises in the application under test.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Standard,
    Problem,
    Performance,
    Error,
    Visual,
    Admin,
}

/// A login credential row seeded into an environment's user pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: UserRole,
}

/// A catalog entry seeded into an environment's product pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestProduct {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub sku: String,
}

/// A prepared order row. Environments currently ship with empty order
/// pools; the schema exists so order-driven suites can seed their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestOrder {
    pub id: String,
    pub items: Vec<String>,
    pub total: f64,
}

/// Everything known about one named test environment: where it runs and
/// which fixture rows its pools start from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentConfig {
    /// Short code used in store file names and `TEST_ENV` (e.g. "qa").
    pub key: String,
    /// Human-facing display name.
    pub name: String,
    pub base_url: String,
    pub api_url: String,
    /// Accent color for reporting surfaces.
    pub color: String,
    pub users: Vec<TestUser>,
    pub products: Vec<TestProduct>,
    pub orders: Vec<TestOrder>,
}
