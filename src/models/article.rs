//! Article model
//!
//! This module provides:
//! - `Article` entity representing a knowledge-base entry
//! - `ArticleStatus` enum for lifecycle states
//! - Input types for creating and updating articles
//! - Pagination parameters for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Article entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Article title
    pub title: String,
    /// Free-text content
    pub content: String,
    /// Lifecycle status
    pub status: ArticleStatus,
    /// ID of the user who created the article
    pub created_by: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Create a new article stamped with the current time
    pub fn new(title: String, content: String, status: ArticleStatus, created_by: i64) -> Self {
        let now = Utc::now();

        Self {
            id: 0, // Will be set by database
            title,
            content,
            status,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Article lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Draft - work in progress
    #[default]
    Draft,
    /// Published - visible to readers
    Published,
    /// Deprecated - archived, kept for reference
    Deprecated,
}

impl ArticleStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
            ArticleStatus::Deprecated => "deprecated",
        }
    }

    /// Parse status from its string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ArticleStatus::Draft),
            "published" => Some(ArticleStatus::Published),
            "deprecated" => Some(ArticleStatus::Deprecated),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArticleInput {
    pub title: String,
    pub content: String,
    /// Defaults to `Draft` when absent
    pub status: Option<ArticleStatus>,
    pub created_by: i64,
}

impl CreateArticleInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>, created_by: i64) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            status: None,
            created_by,
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: ArticleStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Input for replacing the mutable fields of an article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateArticleInput {
    pub title: String,
    pub content: String,
    /// Keeps the current status when absent
    pub status: Option<ArticleStatus>,
}

impl UpdateArticleInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            status: None,
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: ArticleStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Default page size for list queries
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Largest page size a caller may request
pub const MAX_LIST_LIMIT: i64 = 100;

/// Limit/offset pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters, clamping to sane bounds
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIST_LIMIT),
            offset: offset.max(0),
        }
    }
}
