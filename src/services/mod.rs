//! Services layer - Business logic
//!
//! Services implement the business rules on top of the repository traits:
//! validation, tag reconciliation and error classification.

pub mod article;

pub use article::{ArticleDetail, ArticleService, ArticleServiceError, PartialArticle};
