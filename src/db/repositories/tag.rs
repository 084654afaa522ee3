//! Tag repository
//!
//! Database operations for tags and their association with articles.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ArticleTag, Tag};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get tag by exact (case-sensitive) name
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// List all tags ordered by name
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Associate tag with article. Linking an already linked pair is a no-op.
    async fn add_to_article(&self, article_id: i64, tag_id: i64) -> Result<ArticleTag>;

    /// Remove tag from article. Returns whether a link was removed.
    async fn remove_from_article(&self, article_id: i64, tag_id: i64) -> Result<bool>;

    /// Get tags for an article
    async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<Tag>>;
}

/// SQLx-based tag repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_tag_sqlite(self.pool.sqlite()?, tag).await,
            DatabaseDriver::Mysql => create_tag_mysql(self.pool.mysql()?, tag).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_tag_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_by_name_sqlite(self.pool.sqlite()?, name).await,
            DatabaseDriver::Mysql => get_tag_by_name_mysql(self.pool.mysql()?, name).await,
        }
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_tags_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => list_tags_mysql(self.pool.mysql()?).await,
        }
    }

    async fn add_to_article(&self, article_id: i64, tag_id: i64) -> Result<ArticleTag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                add_tag_to_article_sqlite(self.pool.sqlite()?, article_id, tag_id).await
            }
            DatabaseDriver::Mysql => {
                add_tag_to_article_mysql(self.pool.mysql()?, article_id, tag_id).await
            }
        }
    }

    async fn remove_from_article(&self, article_id: i64, tag_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                remove_tag_from_article_sqlite(self.pool.sqlite()?, article_id, tag_id).await
            }
            DatabaseDriver::Mysql => {
                remove_tag_from_article_mysql(self.pool.mysql()?, article_id, tag_id).await
            }
        }
    }

    async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_tags_by_article_sqlite(self.pool.sqlite()?, article_id).await
            }
            DatabaseDriver::Mysql => {
                get_tags_by_article_mysql(self.pool.mysql()?, article_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<Tag> {
    let result = sqlx::query(
        r#"
        INSERT INTO tags (name, created_at)
        VALUES (?, ?)
        "#,
    )
    .bind(&tag.name)
    .bind(tag.created_at)
    .execute(pool)
    .await
    .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        ..tag.clone()
    })
}

async fn get_tag_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, created_at
        FROM tags
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by ID")?;

    Ok(row.as_ref().map(row_to_tag_sqlite))
}

async fn get_tag_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, created_at
        FROM tags
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by name")?;

    Ok(row.as_ref().map(row_to_tag_sqlite))
}

async fn list_tags_sqlite(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, created_at
        FROM tags
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list tags")?;

    Ok(rows.iter().map(row_to_tag_sqlite).collect())
}

async fn get_tags_by_article_sqlite(pool: &SqlitePool, article_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.created_at
        FROM tags t
        INNER JOIN article_tags at ON t.id = at.tag_id
        WHERE at.article_id = ?
        ORDER BY t.name
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to get tags by article")?;

    Ok(rows.iter().map(row_to_tag_sqlite).collect())
}

async fn add_tag_to_article_sqlite(
    pool: &SqlitePool,
    article_id: i64,
    tag_id: i64,
) -> Result<ArticleTag> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO article_tags (article_id, tag_id)
        VALUES (?, ?)
        "#,
    )
    .bind(article_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to add tag to article")?;

    Ok(ArticleTag { article_id, tag_id })
}

async fn remove_tag_from_article_sqlite(
    pool: &SqlitePool,
    article_id: i64,
    tag_id: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM article_tags
        WHERE article_id = ? AND tag_id = ?
        "#,
    )
    .bind(article_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to remove tag from article")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_tag_mysql(pool: &MySqlPool, tag: &Tag) -> Result<Tag> {
    let result = sqlx::query(
        r#"
        INSERT INTO tags (name, created_at)
        VALUES (?, ?)
        "#,
    )
    .bind(&tag.name)
    .bind(tag.created_at)
    .execute(pool)
    .await
    .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_id() as i64,
        ..tag.clone()
    })
}

async fn get_tag_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, created_at
        FROM tags
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by ID")?;

    Ok(row.as_ref().map(row_to_tag_mysql))
}

async fn get_tag_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, created_at
        FROM tags
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by name")?;

    Ok(row.as_ref().map(row_to_tag_mysql))
}

async fn list_tags_mysql(pool: &MySqlPool) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, created_at
        FROM tags
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list tags")?;

    Ok(rows.iter().map(row_to_tag_mysql).collect())
}

async fn get_tags_by_article_mysql(pool: &MySqlPool, article_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.created_at
        FROM tags t
        INNER JOIN article_tags at ON t.id = at.tag_id
        WHERE at.article_id = ?
        ORDER BY t.name
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to get tags by article")?;

    Ok(rows.iter().map(row_to_tag_mysql).collect())
}

async fn add_tag_to_article_mysql(
    pool: &MySqlPool,
    article_id: i64,
    tag_id: i64,
) -> Result<ArticleTag> {
    sqlx::query(
        r#"
        INSERT IGNORE INTO article_tags (article_id, tag_id)
        VALUES (?, ?)
        "#,
    )
    .bind(article_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to add tag to article")?;

    Ok(ArticleTag { article_id, tag_id })
}

async fn remove_tag_from_article_mysql(
    pool: &MySqlPool,
    article_id: i64,
    tag_id: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM article_tags
        WHERE article_id = ? AND tag_id = ?
        "#,
    )
    .bind(article_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to remove tag from article")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_tag_mysql(row: &sqlx::mysql::MySqlRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}
