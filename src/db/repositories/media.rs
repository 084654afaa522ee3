//! Media repository
//!
//! Metadata rows for files attached to articles.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{MediaFile, MediaType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Media repository trait
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Record a new media file
    async fn create(&self, media: &MediaFile) -> Result<MediaFile>;

    /// Get media file by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<MediaFile>>;

    /// Delete a media record. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Media attached to an article, oldest first
    async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<MediaFile>>;
}

/// SQLx-based media repository implementation
pub struct SqlxMediaRepository {
    pool: DynDatabasePool,
}

impl SqlxMediaRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MediaRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MediaRepository for SqlxMediaRepository {
    async fn create(&self, media: &MediaFile) -> Result<MediaFile> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_media_sqlite(self.pool.sqlite()?, media).await,
            DatabaseDriver::Mysql => create_media_mysql(self.pool.mysql()?, media).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<MediaFile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_media_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_media_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_media_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_media_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<MediaFile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_media_by_article_sqlite(self.pool.sqlite()?, article_id).await
            }
            DatabaseDriver::Mysql => {
                get_media_by_article_mysql(self.pool.mysql()?, article_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_media_sqlite(pool: &SqlitePool, media: &MediaFile) -> Result<MediaFile> {
    let result = sqlx::query(
        r#"
        INSERT INTO media_files (filename, path, media_type, size, article_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&media.filename)
    .bind(&media.path)
    .bind(media.media_type.as_str())
    .bind(media.size)
    .bind(media.article_id)
    .bind(media.created_at)
    .execute(pool)
    .await
    .context("Failed to create media file")?;

    Ok(MediaFile {
        id: result.last_insert_rowid(),
        ..media.clone()
    })
}

async fn get_media_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<MediaFile>> {
    let row = sqlx::query(
        r#"
        SELECT id, filename, path, media_type, size, article_id, created_at
        FROM media_files
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get media file by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_media_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn delete_media_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM media_files WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete media file")?;

    Ok(result.rows_affected() > 0)
}

async fn get_media_by_article_sqlite(pool: &SqlitePool, article_id: i64) -> Result<Vec<MediaFile>> {
    let rows = sqlx::query(
        r#"
        SELECT id, filename, path, media_type, size, article_id, created_at
        FROM media_files
        WHERE article_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to get media files by article")?;

    rows.iter().map(row_to_media_sqlite).collect()
}

fn row_to_media_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<MediaFile> {
    let type_str: String = row.get("media_type");
    let media_type = MediaType::from_str(&type_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid media type: {}", type_str))?;

    Ok(MediaFile {
        id: row.get("id"),
        filename: row.get("filename"),
        path: row.get("path"),
        media_type,
        size: row.get("size"),
        article_id: row.get("article_id"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_media_mysql(pool: &MySqlPool, media: &MediaFile) -> Result<MediaFile> {
    let result = sqlx::query(
        r#"
        INSERT INTO media_files (filename, path, media_type, size, article_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&media.filename)
    .bind(&media.path)
    .bind(media.media_type.as_str())
    .bind(media.size)
    .bind(media.article_id)
    .bind(media.created_at)
    .execute(pool)
    .await
    .context("Failed to create media file")?;

    Ok(MediaFile {
        id: result.last_insert_id() as i64,
        ..media.clone()
    })
}

async fn get_media_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<MediaFile>> {
    let row = sqlx::query(
        r#"
        SELECT id, filename, path, media_type, size, article_id, created_at
        FROM media_files
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get media file by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_media_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn delete_media_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM media_files WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete media file")?;

    Ok(result.rows_affected() > 0)
}

async fn get_media_by_article_mysql(pool: &MySqlPool, article_id: i64) -> Result<Vec<MediaFile>> {
    let rows = sqlx::query(
        r#"
        SELECT id, filename, path, media_type, size, article_id, created_at
        FROM media_files
        WHERE article_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to get media files by article")?;

    rows.iter().map(row_to_media_mysql).collect()
}

fn row_to_media_mysql(row: &sqlx::mysql::MySqlRow) -> Result<MediaFile> {
    let type_str: String = row.get("media_type");
    let media_type = MediaType::from_str(&type_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid media type: {}", type_str))?;

    Ok(MediaFile {
        id: row.get("id"),
        filename: row.get("filename"),
        path: row.get("path"),
        media_type,
        size: row.get("size"),
        article_id: row.get("article_id"),
        created_at: row.get("created_at"),
    })
}
