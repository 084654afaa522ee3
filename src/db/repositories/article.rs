//! Article repository
//!
//! Database operations for articles.
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::repositories::search::{ArticleSearch, QueryParam};
use crate::db::DynDatabasePool;
use crate::models::{Article, ArticleStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert a new article; the returned copy carries the assigned ID
    async fn create(&self, article: &Article) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Persist title, content, status and updated_at of an existing article.
    /// Returns `None` if the row no longer exists.
    async fn update(&self, article: &Article) -> Result<Option<Article>>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List articles ordered by ID
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Article>>;

    /// Search articles; filters that are empty/absent are skipped
    async fn search(
        &self,
        query: &str,
        tags: &[String],
        status: Option<ArticleStatus>,
    ) -> Result<Vec<Article>>;

    /// Mark an article deprecated. Returns `None` if it does not exist.
    async fn archive(&self, id: i64, at: DateTime<Utc>) -> Result<Option<Article>>;
}

/// SQLx-based article repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_article_sqlite(self.pool.sqlite()?, article).await,
            DatabaseDriver::Mysql => create_article_mysql(self.pool.mysql()?, article).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_article_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_article_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn update(&self, article: &Article) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_article_sqlite(self.pool.sqlite()?, article).await,
            DatabaseDriver::Mysql => update_article_mysql(self.pool.mysql()?, article).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_article_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_article_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_articles_sqlite(self.pool.sqlite()?, limit, offset).await
            }
            DatabaseDriver::Mysql => list_articles_mysql(self.pool.mysql()?, limit, offset).await,
        }
    }

    async fn search(
        &self,
        query: &str,
        tags: &[String],
        status: Option<ArticleStatus>,
    ) -> Result<Vec<Article>> {
        let search = ArticleSearch::new(query, tags, status);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => search_articles_sqlite(self.pool.sqlite()?, &search).await,
            DatabaseDriver::Mysql => search_articles_mysql(self.pool.mysql()?, &search).await,
        }
    }

    async fn archive(&self, id: i64, at: DateTime<Utc>) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => archive_article_sqlite(self.pool.sqlite()?, id, at).await,
            DatabaseDriver::Mysql => archive_article_mysql(self.pool.mysql()?, id, at).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, content, title_lower, content_lower, status, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(article.title.to_lowercase())
    .bind(article.content.to_lowercase())
    .bind(article.status.as_str())
    .bind(article.created_by)
    .bind(article.created_at)
    .bind(article.updated_at)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_rowid(),
        ..article.clone()
    })
}

async fn get_article_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, content, status, created_by, created_at, updated_at
        FROM articles
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_article_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Option<Article>> {
    sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, content = ?, title_lower = ?, content_lower = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(article.title.to_lowercase())
    .bind(article.content.to_lowercase())
    .bind(article.status.as_str())
    .bind(article.updated_at)
    .bind(article.id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    get_article_by_id_sqlite(pool, article.id).await
}

async fn delete_article_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    // article_tags and media_files rows go with it (ON DELETE CASCADE)
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(result.rows_affected() > 0)
}

async fn list_articles_sqlite(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, content, status, created_by, created_at, updated_at
        FROM articles
        ORDER BY id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list articles")?;

    rows.iter().map(row_to_article_sqlite).collect()
}

async fn search_articles_sqlite(pool: &SqlitePool, search: &ArticleSearch<'_>) -> Result<Vec<Article>> {
    let (sql, params) = search.build();

    let mut query = sqlx::query::<sqlx::Sqlite>(&sql);
    for param in &params {
        query = match param {
            QueryParam::Text(s) => query.bind(s.as_str()),
            QueryParam::Int(n) => query.bind(*n),
        };
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to search articles")?;

    rows.iter().map(row_to_article_sqlite).collect()
}

async fn archive_article_sqlite(
    pool: &SqlitePool,
    id: i64,
    at: DateTime<Utc>,
) -> Result<Option<Article>> {
    sqlx::query("UPDATE articles SET status = ?, updated_at = ? WHERE id = ?")
        .bind(ArticleStatus::Deprecated.as_str())
        .bind(at)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to archive article")?;

    get_article_by_id_sqlite(pool, id).await
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid article status: {}", status_str))?;

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        status,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, article: &Article) -> Result<Article> {
    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, content, title_lower, content_lower, status, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(article.title.to_lowercase())
    .bind(article.content.to_lowercase())
    .bind(article.status.as_str())
    .bind(article.created_by)
    .bind(article.created_at)
    .bind(article.updated_at)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_id() as i64,
        ..article.clone()
    })
}

async fn get_article_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, content, status, created_by, created_at, updated_at
        FROM articles
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_article_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn update_article_mysql(pool: &MySqlPool, article: &Article) -> Result<Option<Article>> {
    // MySQL reports 0 affected rows for a no-op update, so existence is
    // decided by the re-read rather than rows_affected
    sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, content = ?, title_lower = ?, content_lower = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(article.title.to_lowercase())
    .bind(article.content.to_lowercase())
    .bind(article.status.as_str())
    .bind(article.updated_at)
    .bind(article.id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    get_article_by_id_mysql(pool, article.id).await
}

async fn delete_article_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(result.rows_affected() > 0)
}

async fn list_articles_mysql(pool: &MySqlPool, limit: i64, offset: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, content, status, created_by, created_at, updated_at
        FROM articles
        ORDER BY id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list articles")?;

    rows.iter().map(row_to_article_mysql).collect()
}

async fn search_articles_mysql(pool: &MySqlPool, search: &ArticleSearch<'_>) -> Result<Vec<Article>> {
    let (sql, params) = search.build();

    let mut query = sqlx::query::<sqlx::MySql>(&sql);
    for param in &params {
        query = match param {
            QueryParam::Text(s) => query.bind(s.as_str()),
            QueryParam::Int(n) => query.bind(*n),
        };
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to search articles")?;

    rows.iter().map(row_to_article_mysql).collect()
}

async fn archive_article_mysql(
    pool: &MySqlPool,
    id: i64,
    at: DateTime<Utc>,
) -> Result<Option<Article>> {
    sqlx::query("UPDATE articles SET status = ?, updated_at = ? WHERE id = ?")
        .bind(ArticleStatus::Deprecated.as_str())
        .bind(at)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to archive article")?;

    get_article_by_id_mysql(pool, id).await
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid article status: {}", status_str))?;

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        status,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
