//! Data models
//!
//! This module contains the data structures used throughout the kbase service:
//! - Database entities (Article, Tag, ArticleTag, MediaFile)
//! - Input types for the article service
//! - Pagination parameters

mod article;
mod media;
mod tag;

pub use article::{
    Article, ArticleStatus, CreateArticleInput, ListParams, UpdateArticleInput,
    DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};
pub use media::{CreateMediaInput, MediaFile, MediaType};
pub use tag::{ArticleTag, Tag};
