//! finreview-server: HTTP API for financial review workflows
//!
//! CRUD endpoints over entities, GL accounts, trial reports, stakeholders,
//! assignments, notifications and variance records, backed by PostgreSQL.
//! Every successful write leaves an audit log row.

pub mod db;
pub mod http;
pub mod models;

pub use db::{create_lazy_pool, create_pool, create_pool_with_options, DbError};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
pub use models::ValidationError;
