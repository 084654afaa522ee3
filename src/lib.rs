//! kbase - A knowledge-base article service
//!
//! Articles with many-to-many tags, attached media metadata, tag
//! reconciliation on update and composable search, served over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
