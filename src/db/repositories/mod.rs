//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the operations for a specific entity.

pub mod article;
pub mod media;
pub mod search;
pub mod tag;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use media::{MediaRepository, SqlxMediaRepository};
pub use tag::{SqlxTagRepository, TagRepository};
