//! Media file model
//!
//! Only metadata lives here; the binary itself sits wherever `path` points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Media file attached to an article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Unique identifier
    pub id: i64,
    /// Original file name
    pub filename: String,
    /// Storage path
    pub path: String,
    /// Kind of media
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Size in bytes
    pub size: i64,
    /// Owning article
    pub article_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    /// Parse from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "image" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for attaching a media file to an article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMediaInput {
    pub filename: String,
    pub path: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub size: i64,
}

impl MediaFile {
    /// Build an unsaved media record for the given article
    pub fn from_input(article_id: i64, input: CreateMediaInput) -> Self {
        Self {
            id: 0,
            filename: input.filename,
            path: input.path,
            media_type: input.media_type,
            size: input.size,
            article_id,
            created_at: Utc::now(),
        }
    }
}
