//! # axum-oracle
//!
//! Oracle connection pool plugin for axum applications.
//!
//! This crate glues two external systems together: the axum extension
//! mechanism on one side and the `oracle` driver's connection pooling
//! on the other. It validates pool configuration, creates or reuses a
//! pool, prevents duplicate registrations through a named registry, and
//! exposes the result to handlers as request extractors with a small
//! JSON query convenience layer. Pooling itself — connection health,
//! growth, backpressure — is delegated entirely to the driver.
//!
//! ## Architecture
//!
//! ```text
//! Handlers (Oracle / OracleRegistry extractors)
//!     │
//!     ├── attach() — Extension layer (extract/)
//!     │
//!     ├── OracleRegistry — named registrations (registry/)
//!     ├── Oracle — pool handle + JSON query layer (pool/, rows/)
//!     │
//!     └── oracle driver — the actual connection pool
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use axum::routing::get;
//! use axum::{Json, Router};
//! use axum_oracle::{Oracle, OracleConfig, OracleRegistry, PoolSettings, attach};
//!
//! async fn users(db: Oracle) -> Result<Json<Vec<serde_json::Value>>, axum_oracle::OracleError> {
//!     let rows = db.query("SELECT id, name FROM users", &[]).await?;
//!     Ok(Json(rows))
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = OracleRegistry::new();
//! let settings = PoolSettings::new("scott", "tiger", "//localhost:1521/XEPDB1");
//! registry.register(OracleConfig::from_settings(settings)).await?;
//!
//! let app: Router = attach(Router::new().route("/users", get(users)), registry);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod pool;
pub mod registry;
mod rows;

pub use config::{FetchAsString, OracleConfig, OutFormat, PoolSettings, PoolSource};
pub use error::OracleError;
pub use extract::attach;
pub use pool::Oracle;
pub use registry::{DEFAULT_POOL_NAME, OracleRegistry};
