//! Database layer
//!
//! Storage for articles, tags and media files. Two backends are supported:
//! - SQLite (default, single-file deployment)
//! - MySQL
//!
//! The driver is picked from configuration. Repositories hold a
//! [`DynDatabasePool`] and dispatch on [`DatabasePool::driver`].
//!
//! # Usage
//!
//! ```ignore
//! use kbase::config::DatabaseConfig;
//! use kbase::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
