//! Database layer - connection pool, schema, and repositories
//!
//! # Design Principles
//!
//! - Connection pool (max 5 connections by default) - no Arc<Mutex<Connection>>
//! - Rely on DB constraints, map violations - no check-then-insert for uniqueness
//! - One statement per write; partial updates use COALESCE in SQL
//! - Dynamic list filters go through `sqlx::QueryBuilder` with bound values

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use error::DbError;
pub use pool::{create_lazy_pool, create_pool, create_pool_with_options};
pub use repos::*;
