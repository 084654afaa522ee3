//! Article service
//!
//! Business logic for the article lifecycle:
//! - Create, read, update and archive articles
//! - Tag reconciliation when an article's tag list changes
//! - Search and pagination
//! - Media metadata attached to articles
//!
//! Tags are identified by exact name. A name that does not exist yet is
//! created on first use.

use crate::db::repositories::{ArticleRepository, MediaRepository, TagRepository};
use crate::models::{
    Article, ArticleStatus, CreateArticleInput, CreateMediaInput, ListParams, MediaFile, Tag,
    UpdateArticleInput,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Article or media not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The article loaded but its tags or media did not
    #[error("Failed to load related data for article {}: {source}", .partial.article.id)]
    Partial {
        partial: Box<PartialArticle>,
        source: anyhow::Error,
    },

    /// Store failure
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Full view of an article
#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetail {
    pub article: Article,
    pub tags: Vec<Tag>,
    pub media: Vec<MediaFile>,
}

/// What was loaded before a related lookup failed
#[derive(Debug, Clone)]
pub struct PartialArticle {
    pub article: Article,
    /// `None` if the tag lookup was the one that failed
    pub tags: Option<Vec<Tag>>,
}

/// Article service
pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
    tag_repo: Arc<dyn TagRepository>,
    media_repo: Arc<dyn MediaRepository>,
}

impl ArticleService {
    /// Create a new article service
    pub fn new(
        repo: Arc<dyn ArticleRepository>,
        tag_repo: Arc<dyn TagRepository>,
        media_repo: Arc<dyn MediaRepository>,
    ) -> Self {
        Self {
            repo,
            tag_repo,
            media_repo,
        }
    }

    /// Create a new article and link it to the given tags
    ///
    /// The article row is written first. Tags are then looked up or created
    /// and linked one at a time; duplicate names collapse to a single link.
    ///
    /// # Errors
    /// - `ValidationError` if the title or a tag name is blank or too long
    /// - `InternalError` if the article or any tag operation fails. Links
    ///   made before a failing tag stay in place.
    pub async fn create(
        &self,
        input: CreateArticleInput,
        tag_names: &[String],
    ) -> Result<Article, ArticleServiceError> {
        validate_title(&input.title)?;
        validate_tag_names(tag_names)?;

        let article = Article::new(
            input.title,
            input.content,
            input.status.unwrap_or_default(),
            input.created_by,
        );

        let created = self
            .repo
            .create(&article)
            .await
            .context("Failed to create article")?;

        for name in distinct_tag_names(tag_names) {
            self.link_tag(created.id, name).await?;
        }

        tracing::info!(article_id = created.id, "Article created");
        Ok(created)
    }

    /// Get an article together with its tags and media
    ///
    /// # Errors
    /// - `NotFound` if there is no such article
    /// - `Partial` if the article loaded but its tags or media could not be
    ///   fetched; carries whatever was loaded
    pub async fn get_by_id(&self, id: i64) -> Result<ArticleDetail, ArticleServiceError> {
        let article = self.require_article(id).await?;

        let tags = match self.tag_repo.get_by_article_id(id).await {
            Ok(tags) => tags,
            Err(source) => {
                return Err(ArticleServiceError::Partial {
                    partial: Box::new(PartialArticle {
                        article,
                        tags: None,
                    }),
                    source: source.context("Failed to get tags for article"),
                })
            }
        };

        let media = match self.media_repo.get_by_article_id(id).await {
            Ok(media) => media,
            Err(source) => {
                return Err(ArticleServiceError::Partial {
                    partial: Box::new(PartialArticle {
                        article,
                        tags: Some(tags),
                    }),
                    source: source.context("Failed to get media for article"),
                })
            }
        };

        Ok(ArticleDetail {
            article,
            tags,
            media,
        })
    }

    /// Replace an article's title, content and (optionally) status, then
    /// reconcile its tags against `tag_names`
    ///
    /// `created_at` and `created_by` are preserved. Calling this twice with
    /// the same tag list leaves the same links as calling it once.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateArticleInput,
        tag_names: &[String],
    ) -> Result<Article, ArticleServiceError> {
        validate_title(&input.title)?;
        validate_tag_names(tag_names)?;

        let existing = self.require_article(id).await?;

        let article = Article {
            title: input.title,
            content: input.content,
            status: input.status.unwrap_or(existing.status),
            updated_at: touch(existing.created_at),
            ..existing
        };

        let saved = self
            .repo
            .update(&article)
            .await
            .context("Failed to update article")?
            .ok_or_else(|| not_found(id))?;

        self.reconcile_tags(id, tag_names).await?;

        tracing::info!(article_id = id, "Article updated");
        Ok(saved)
    }

    /// Soft delete: mark the article deprecated and bump `updated_at`
    pub async fn archive(&self, id: i64) -> Result<Article, ArticleServiceError> {
        let existing = self.require_article(id).await?;

        let archived = self
            .repo
            .archive(id, touch(existing.created_at))
            .await
            .context("Failed to archive article")?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(article_id = id, "Article archived");
        Ok(archived)
    }

    /// Search articles. Empty query, empty tag list and `None` status each
    /// disable their filter.
    pub async fn search(
        &self,
        query: &str,
        tags: &[String],
        status: Option<ArticleStatus>,
    ) -> Result<Vec<Article>, ArticleServiceError> {
        let articles = self
            .repo
            .search(query, tags, status)
            .await
            .context("Failed to search articles")?;
        Ok(articles)
    }

    /// List articles in ID order
    pub async fn list(&self, params: &ListParams) -> Result<Vec<Article>, ArticleServiceError> {
        let articles = self
            .repo
            .list(params.limit, params.offset)
            .await
            .context("Failed to list articles")?;
        Ok(articles)
    }

    /// All tags, sorted by name
    pub async fn list_tags(&self) -> Result<Vec<Tag>, ArticleServiceError> {
        let tags = self.tag_repo.list().await.context("Failed to list tags")?;
        Ok(tags)
    }

    /// Record a media file for an existing article
    pub async fn attach_media(
        &self,
        article_id: i64,
        input: CreateMediaInput,
    ) -> Result<MediaFile, ArticleServiceError> {
        if input.filename.trim().is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "Filename cannot be empty".to_string(),
            ));
        }
        if input.path.trim().is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "Path cannot be empty".to_string(),
            ));
        }
        if input.size < 0 {
            return Err(ArticleServiceError::ValidationError(
                "Size cannot be negative".to_string(),
            ));
        }

        self.require_article(article_id).await?;

        let media = self
            .media_repo
            .create(&MediaFile::from_input(article_id, input))
            .await
            .context("Failed to create media file")?;

        tracing::info!(article_id, media_id = media.id, "Media attached");
        Ok(media)
    }

    /// Delete a media record
    pub async fn remove_media(&self, id: i64) -> Result<(), ArticleServiceError> {
        let deleted = self
            .media_repo
            .delete(id)
            .await
            .context("Failed to delete media file")?;

        if !deleted {
            return Err(ArticleServiceError::NotFound(format!("media {}", id)));
        }

        tracing::info!(media_id = id, "Media removed");
        Ok(())
    }

    async fn require_article(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get article by ID")?
            .ok_or_else(|| not_found(id))
    }

    /// Unlink current tags that are not requested, link requested tags that
    /// are not current. Tags in neither set are untouched.
    async fn reconcile_tags(
        &self,
        article_id: i64,
        tag_names: &[String],
    ) -> Result<(), ArticleServiceError> {
        let requested = distinct_tag_names(tag_names);
        let current = self
            .tag_repo
            .get_by_article_id(article_id)
            .await
            .context("Failed to get current tags")?;

        for tag in &current {
            if !requested.contains(&tag.name.as_str()) {
                self.tag_repo
                    .remove_from_article(article_id, tag.id)
                    .await
                    .with_context(|| format!("Failed to unlink tag {}", tag.name))?;
                tracing::debug!(article_id, tag = %tag.name, "Tag unlinked");
            }
        }

        for name in requested {
            if !current.iter().any(|t| t.name == name) {
                self.link_tag(article_id, name).await?;
            }
        }

        Ok(())
    }

    async fn link_tag(&self, article_id: i64, name: &str) -> Result<(), ArticleServiceError> {
        let tag = self.find_or_create_tag(name).await?;
        self.tag_repo
            .add_to_article(article_id, tag.id)
            .await
            .with_context(|| format!("Failed to link tag {}", name))?;
        tracing::debug!(article_id, tag = %name, "Tag linked");
        Ok(())
    }

    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, ArticleServiceError> {
        if let Some(tag) = self
            .tag_repo
            .get_by_name(name)
            .await
            .context("Failed to get tag by name")?
        {
            return Ok(tag);
        }

        match self.tag_repo.create(&Tag::new(name)).await {
            Ok(tag) => Ok(tag),
            Err(err) => {
                // Another request may have created it in the meantime
                match self
                    .tag_repo
                    .get_by_name(name)
                    .await
                    .context("Failed to get tag by name")?
                {
                    Some(tag) => Ok(tag),
                    None => Err(err.context(format!("Failed to create tag {}", name)).into()),
                }
            }
        }
    }
}

fn not_found(id: i64) -> ArticleServiceError {
    ArticleServiceError::NotFound(format!("article {}", id))
}

/// Current time, never earlier than `created_at`
fn touch(created_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(created_at)
}

/// Column widths of `articles.title` and `tags.name`, in characters
const MAX_TITLE_LEN: usize = 255;
const MAX_TAG_NAME_LEN: usize = 100;

fn validate_title(title: &str) -> Result<(), ArticleServiceError> {
    if title.trim().is_empty() {
        return Err(ArticleServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ArticleServiceError::ValidationError(format!(
            "Title cannot exceed {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn validate_tag_names(names: &[String]) -> Result<(), ArticleServiceError> {
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(ArticleServiceError::ValidationError(
            "Tag names cannot be empty".to_string(),
        ));
    }
    if let Some(name) = names.iter().find(|n| n.chars().count() > MAX_TAG_NAME_LEN) {
        return Err(ArticleServiceError::ValidationError(format!(
            "Tag name {:?} exceeds {} characters",
            name, MAX_TAG_NAME_LEN
        )));
    }
    Ok(())
}

/// Deduplicate, keeping first-seen order
fn distinct_tag_names(names: &[String]) -> Vec<&str> {
    let mut distinct: Vec<&str> = Vec::with_capacity(names.len());
    for name in names {
        if !distinct.contains(&name.as_str()) {
            distinct.push(name);
        }
    }
    distinct
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxArticleRepository, SqlxMediaRepository, SqlxTagRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{ArticleTag, MediaType};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn setup_test_service() -> (DynDatabasePool, ArticleService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = ArticleService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            SqlxTagRepository::boxed(pool.clone()),
            SqlxMediaRepository::boxed(pool.clone()),
        );
        (pool, service)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn tag_names_of(detail: &ArticleDetail) -> Vec<String> {
        let mut names: Vec<String> = detail.tags.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }

    async fn link_count(pool: &DynDatabasePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM article_tags")
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_defaults_to_draft() {
        let (_pool, service) = setup_test_service().await;

        let article = service
            .create(CreateArticleInput::new("Hello", "World", 1), &[])
            .await
            .expect("create should succeed");

        assert!(article.id > 0);
        assert_eq!(article.status, ArticleStatus::Draft);
        assert_eq!(article.created_at, article.updated_at);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .create(CreateArticleInput::new("   ", "body", 1), &[])
            .await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_overlong_title_and_tag_name_are_validation_errors() {
        let (_pool, service) = setup_test_service().await;

        let long_title = "ü".repeat(MAX_TITLE_LEN + 1);
        let result = service
            .create(CreateArticleInput::new(long_title, "", 1), &[])
            .await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));

        // Multi-byte characters count once each
        let widest = "ü".repeat(MAX_TITLE_LEN);
        let created = service
            .create(CreateArticleInput::new(widest, "", 1), &[])
            .await
            .unwrap();

        let long_tag = vec!["t".repeat(MAX_TAG_NAME_LEN + 1)];
        let result = service
            .update(created.id, UpdateArticleInput::new("T", ""), &long_tag)
            .await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_tag_name() {
        let (pool, service) = setup_test_service().await;

        let result = service
            .create(CreateArticleInput::new("T", "", 1), &names(&["ok", " "]))
            .await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));

        // Nothing was written
        let articles = service.list(&ListParams::default()).await.unwrap();
        assert!(articles.is_empty());
        assert_eq!(link_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_create_with_duplicate_tags_links_once() {
        let (pool, service) = setup_test_service().await;

        let article = service
            .create(
                CreateArticleInput::new("Tagged", "", 1),
                &names(&["rust", "rust", "web", "rust"]),
            )
            .await
            .unwrap();

        let detail = service.get_by_id(article.id).await.unwrap();
        assert_eq!(tag_names_of(&detail), vec!["rust", "web"]);
        assert_eq!(link_count(&pool).await, 2);
        assert_eq!(service.list_tags().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_reuses_existing_tags() {
        let (_pool, service) = setup_test_service().await;

        service
            .create(CreateArticleInput::new("A", "", 1), &names(&["shared"]))
            .await
            .unwrap();
        service
            .create(CreateArticleInput::new("B", "", 1), &names(&["shared"]))
            .await
            .unwrap();

        assert_eq!(service.list_tags().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_article_is_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.get_by_id(999).await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_by_id_includes_media() {
        let (_pool, service) = setup_test_service().await;
        let article = service
            .create(CreateArticleInput::new("With media", "", 1), &[])
            .await
            .unwrap();

        service
            .attach_media(
                article.id,
                CreateMediaInput {
                    filename: "shot.png".to_string(),
                    path: "uploads/shot.png".to_string(),
                    media_type: MediaType::Image,
                    size: 512,
                },
            )
            .await
            .unwrap();

        let detail = service.get_by_id(article.id).await.unwrap();
        assert_eq!(detail.media.len(), 1);
        assert_eq!(detail.media[0].filename, "shot.png");
    }

    #[tokio::test]
    async fn test_update_with_disjoint_tags_replaces_links() {
        let (_pool, service) = setup_test_service().await;
        let article = service
            .create(CreateArticleInput::new("T", "", 1), &names(&["a", "b"]))
            .await
            .unwrap();
        let other = service
            .create(CreateArticleInput::new("Other", "", 1), &names(&["a", "z"]))
            .await
            .unwrap();

        service
            .update(article.id, UpdateArticleInput::new("T", ""), &names(&["c", "d"]))
            .await
            .unwrap();

        let detail = service.get_by_id(article.id).await.unwrap();
        assert_eq!(tag_names_of(&detail), vec!["c", "d"]);

        // Another article's links are untouched
        let other_detail = service.get_by_id(other.id).await.unwrap();
        assert_eq!(tag_names_of(&other_detail), vec!["a", "z"]);
    }

    #[tokio::test]
    async fn test_update_keeps_overlapping_tags() {
        let (pool, service) = setup_test_service().await;
        let article = service
            .create(CreateArticleInput::new("T", "", 1), &names(&["a", "b"]))
            .await
            .unwrap();

        service
            .update(article.id, UpdateArticleInput::new("T", ""), &names(&["b", "c"]))
            .await
            .unwrap();

        let detail = service.get_by_id(article.id).await.unwrap();
        assert_eq!(tag_names_of(&detail), vec!["b", "c"]);
        assert_eq!(link_count(&pool).await, 2);
    }

    #[tokio::test]
    async fn test_update_twice_same_tags_is_idempotent() {
        let (pool, service) = setup_test_service().await;
        let article = service
            .create(CreateArticleInput::new("T", "", 1), &names(&["a"]))
            .await
            .unwrap();
        let tags = names(&["x", "y"]);

        service
            .update(article.id, UpdateArticleInput::new("T", ""), &tags)
            .await
            .unwrap();
        let after_once = tag_names_of(&service.get_by_id(article.id).await.unwrap());
        let links_once = link_count(&pool).await;

        service
            .update(article.id, UpdateArticleInput::new("T", ""), &tags)
            .await
            .unwrap();
        let after_twice = tag_names_of(&service.get_by_id(article.id).await.unwrap());

        assert_eq!(after_once, after_twice);
        assert_eq!(links_once, link_count(&pool).await);
    }

    #[tokio::test]
    async fn test_update_preserves_creation_fields() {
        let (_pool, service) = setup_test_service().await;
        let article = service
            .create(
                CreateArticleInput::new("Old", "old", 7).with_status(ArticleStatus::Published),
                &[],
            )
            .await
            .unwrap();

        let updated = service
            .update(article.id, UpdateArticleInput::new("New", "new"), &[])
            .await
            .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.content, "new");
        assert_eq!(updated.status, ArticleStatus::Published);
        assert_eq!(updated.created_by, 7);
        assert_eq!(updated.created_at, article.created_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_update_changes_status_when_given() {
        let (_pool, service) = setup_test_service().await;
        let article = service
            .create(CreateArticleInput::new("T", "", 1), &[])
            .await
            .unwrap();

        let updated = service
            .update(
                article.id,
                UpdateArticleInput::new("T", "").with_status(ArticleStatus::Published),
                &[],
            )
            .await
            .unwrap();

        assert_eq!(updated.status, ArticleStatus::Published);
    }

    #[tokio::test]
    async fn test_update_missing_article_is_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .update(404, UpdateArticleInput::new("T", ""), &[])
            .await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_archive_keeps_fields() {
        let (_pool, service) = setup_test_service().await;
        let article = service
            .create(CreateArticleInput::new("Keep", "body", 1), &names(&["t"]))
            .await
            .unwrap();

        let archived = service.archive(article.id).await.unwrap();

        assert_eq!(archived.status, ArticleStatus::Deprecated);
        assert_eq!(archived.title, "Keep");
        assert_eq!(archived.content, "body");
        assert_eq!(archived.created_at, article.created_at);
        assert!(archived.updated_at >= article.updated_at);

        // Soft delete: still retrievable with its tags
        let detail = service.get_by_id(article.id).await.unwrap();
        assert_eq!(detail.article.status, ArticleStatus::Deprecated);
        assert_eq!(detail.tags.len(), 1);
    }

    #[tokio::test]
    async fn test_archive_missing_article_is_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.archive(1).await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_and_list_delegate() {
        let (_pool, service) = setup_test_service().await;
        for i in 0..15 {
            let tags = if i % 2 == 0 { names(&["even"]) } else { vec![] };
            service
                .create(CreateArticleInput::new(format!("Article {}", i), "", 1), &tags)
                .await
                .unwrap();
        }

        assert_eq!(service.list(&ListParams::new(10, 0)).await.unwrap().len(), 10);
        assert_eq!(service.list(&ListParams::new(10, 10)).await.unwrap().len(), 5);

        let even = service.search("", &names(&["even"]), None).await.unwrap();
        assert_eq!(even.len(), 8);

        let drafts = service
            .search("article 1", &[], Some(ArticleStatus::Draft))
            .await
            .unwrap();
        // "Article 1" and "Article 10".."Article 14"
        assert_eq!(drafts.len(), 6);
    }

    #[tokio::test]
    async fn test_attach_media_to_missing_article() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .attach_media(
                99,
                CreateMediaInput {
                    filename: "a.mp4".to_string(),
                    path: "uploads/a.mp4".to_string(),
                    media_type: MediaType::Video,
                    size: 1,
                },
            )
            .await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_attach_media_rejects_negative_size() {
        let (_pool, service) = setup_test_service().await;
        let article = service
            .create(CreateArticleInput::new("T", "", 1), &[])
            .await
            .unwrap();

        let result = service
            .attach_media(
                article.id,
                CreateMediaInput {
                    filename: "a.png".to_string(),
                    path: "uploads/a.png".to_string(),
                    media_type: MediaType::Image,
                    size: -1,
                },
            )
            .await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_remove_media() {
        let (_pool, service) = setup_test_service().await;
        let article = service
            .create(CreateArticleInput::new("T", "", 1), &[])
            .await
            .unwrap();
        let media = service
            .attach_media(
                article.id,
                CreateMediaInput {
                    filename: "a.png".to_string(),
                    path: "uploads/a.png".to_string(),
                    media_type: MediaType::Image,
                    size: 10,
                },
            )
            .await
            .unwrap();

        service.remove_media(media.id).await.unwrap();

        let again = service.remove_media(media.id).await;
        assert!(matches!(again, Err(ArticleServiceError::NotFound(_))));
        assert!(service.get_by_id(article.id).await.unwrap().media.is_empty());
    }

    #[test]
    fn test_distinct_tag_names_keeps_first_seen_order() {
        let input = names(&["b", "a", "b", "c", "a"]);
        assert_eq!(distinct_tag_names(&input), vec!["b", "a", "c"]);
    }

    // ========================================================================
    // Failure injection
    // ========================================================================

    /// Article repository whose every call fails
    struct FailingArticleRepo;

    #[async_trait]
    impl ArticleRepository for FailingArticleRepo {
        async fn create(&self, _article: &Article) -> Result<Article> {
            Err(anyhow!("store unavailable"))
        }
        async fn get_by_id(&self, _id: i64) -> Result<Option<Article>> {
            Err(anyhow!("store unavailable"))
        }
        async fn update(&self, _article: &Article) -> Result<Option<Article>> {
            Err(anyhow!("store unavailable"))
        }
        async fn delete(&self, _id: i64) -> Result<bool> {
            Err(anyhow!("store unavailable"))
        }
        async fn list(&self, _limit: i64, _offset: i64) -> Result<Vec<Article>> {
            Err(anyhow!("store unavailable"))
        }
        async fn search(
            &self,
            _query: &str,
            _tags: &[String],
            _status: Option<ArticleStatus>,
        ) -> Result<Vec<Article>> {
            Err(anyhow!("store unavailable"))
        }
        async fn archive(&self, _id: i64, _at: DateTime<Utc>) -> Result<Option<Article>> {
            Err(anyhow!("store unavailable"))
        }
    }

    /// Tag repository that counts calls and fails lookups by article
    #[derive(Default)]
    struct CountingTagRepo {
        calls: AtomicUsize,
    }

    impl CountingTagRepo {
        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TagRepository for CountingTagRepo {
        async fn create(&self, tag: &Tag) -> Result<Tag> {
            self.hit();
            Ok(Tag { id: 1, ..tag.clone() })
        }
        async fn get_by_id(&self, _id: i64) -> Result<Option<Tag>> {
            self.hit();
            Ok(None)
        }
        async fn get_by_name(&self, _name: &str) -> Result<Option<Tag>> {
            self.hit();
            Ok(None)
        }
        async fn list(&self) -> Result<Vec<Tag>> {
            self.hit();
            Ok(vec![])
        }
        async fn add_to_article(&self, article_id: i64, tag_id: i64) -> Result<ArticleTag> {
            self.hit();
            Ok(ArticleTag { article_id, tag_id })
        }
        async fn remove_from_article(&self, _article_id: i64, _tag_id: i64) -> Result<bool> {
            self.hit();
            Ok(true)
        }
        async fn get_by_article_id(&self, _article_id: i64) -> Result<Vec<Tag>> {
            self.hit();
            Err(anyhow!("tag lookup failed"))
        }
    }

    /// Media repository whose lookups by article fail
    struct FailingMediaRepo;

    #[async_trait]
    impl MediaRepository for FailingMediaRepo {
        async fn create(&self, _media: &MediaFile) -> Result<MediaFile> {
            Err(anyhow!("media store unavailable"))
        }
        async fn get_by_id(&self, _id: i64) -> Result<Option<MediaFile>> {
            Err(anyhow!("media store unavailable"))
        }
        async fn delete(&self, _id: i64) -> Result<bool> {
            Err(anyhow!("media store unavailable"))
        }
        async fn get_by_article_id(&self, _article_id: i64) -> Result<Vec<MediaFile>> {
            Err(anyhow!("media store unavailable"))
        }
    }

    #[tokio::test]
    async fn test_failed_article_create_skips_tag_work() {
        let tags = Arc::new(CountingTagRepo::default());
        let service = ArticleService::new(
            Arc::new(FailingArticleRepo),
            tags.clone(),
            Arc::new(FailingMediaRepo),
        );

        let result = service
            .create(CreateArticleInput::new("T", "", 1), &names(&["a", "b"]))
            .await;

        assert!(matches!(result, Err(ArticleServiceError::InternalError(_))));
        assert_eq!(tags.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_not_not_found() {
        let service = ArticleService::new(
            Arc::new(FailingArticleRepo),
            Arc::new(CountingTagRepo::default()),
            Arc::new(FailingMediaRepo),
        );

        let result = service.get_by_id(1).await;
        assert!(matches!(result, Err(ArticleServiceError::InternalError(_))));
    }

    #[tokio::test]
    async fn test_tag_lookup_failure_returns_partial_article() {
        let (pool, _service) = setup_test_service().await;
        let articles = SqlxArticleRepository::boxed(pool.clone());
        let created = articles
            .create(&Article::new("Partial".into(), "".into(), ArticleStatus::Draft, 1))
            .await
            .unwrap();

        let service = ArticleService::new(
            articles,
            Arc::new(CountingTagRepo::default()),
            SqlxMediaRepository::boxed(pool.clone()),
        );

        match service.get_by_id(created.id).await {
            Err(ArticleServiceError::Partial { partial, .. }) => {
                assert_eq!(partial.article.id, created.id);
                assert!(partial.tags.is_none());
            }
            other => panic!("expected partial result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_media_lookup_failure_returns_article_and_tags() {
        let (pool, service) = setup_test_service().await;
        let created = service
            .create(CreateArticleInput::new("Partial", "", 1), &names(&["kept"]))
            .await
            .unwrap();

        let service = ArticleService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            SqlxTagRepository::boxed(pool.clone()),
            Arc::new(FailingMediaRepo),
        );

        match service.get_by_id(created.id).await {
            Err(ArticleServiceError::Partial { partial, .. }) => {
                assert_eq!(partial.article.title, "Partial");
                let tags = partial.tags.expect("tags should have loaded");
                assert_eq!(tags.len(), 1);
                assert_eq!(tags[0].name, "kept");
            }
            other => panic!("expected partial result, got {:?}", other),
        }
    }

    /// Real tag store whose `add_to_article` fails on the given call (1-based)
    struct FlakyLinkTagRepo {
        inner: Arc<dyn TagRepository>,
        fail_on: usize,
        links: AtomicUsize,
    }

    impl FlakyLinkTagRepo {
        fn new(pool: &DynDatabasePool, fail_on: usize) -> Self {
            Self {
                inner: SqlxTagRepository::boxed(pool.clone()),
                fail_on,
                links: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TagRepository for FlakyLinkTagRepo {
        async fn create(&self, tag: &Tag) -> Result<Tag> {
            self.inner.create(tag).await
        }
        async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
            self.inner.get_by_id(id).await
        }
        async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
            self.inner.get_by_name(name).await
        }
        async fn list(&self) -> Result<Vec<Tag>> {
            self.inner.list().await
        }
        async fn add_to_article(&self, article_id: i64, tag_id: i64) -> Result<ArticleTag> {
            let call = self.links.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                return Err(anyhow!("link store unavailable"));
            }
            self.inner.add_to_article(article_id, tag_id).await
        }
        async fn remove_from_article(&self, article_id: i64, tag_id: i64) -> Result<bool> {
            self.inner.remove_from_article(article_id, tag_id).await
        }
        async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<Tag>> {
            self.inner.get_by_article_id(article_id).await
        }
    }

    async fn stored_tag_names(pool: &DynDatabasePool, article_id: i64) -> Vec<String> {
        let mut names: Vec<String> = SqlxTagRepository::new(pool.clone())
            .get_by_article_id(article_id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_create_keeps_links_made_before_failing_tag() {
        let (pool, _service) = setup_test_service().await;
        let articles = SqlxArticleRepository::boxed(pool.clone());
        let service = ArticleService::new(
            articles.clone(),
            Arc::new(FlakyLinkTagRepo::new(&pool, 2)),
            SqlxMediaRepository::boxed(pool.clone()),
        );

        let result = service
            .create(CreateArticleInput::new("T", "", 1), &names(&["a", "b", "c"]))
            .await;
        assert!(matches!(result, Err(ArticleServiceError::InternalError(_))));

        // The article row was written before the tags
        let stored = articles.list(10, 0).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored_tag_names(&pool, stored[0].id).await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_update_saves_row_before_tag_failure() {
        let (pool, service) = setup_test_service().await;
        let created = service
            .create(CreateArticleInput::new("Old", "", 1), &names(&["a", "b"]))
            .await
            .unwrap();

        let flaky = ArticleService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            Arc::new(FlakyLinkTagRepo::new(&pool, 2)),
            SqlxMediaRepository::boxed(pool.clone()),
        );
        let result = flaky
            .update(
                created.id,
                UpdateArticleInput::new("New", "changed"),
                &names(&["c", "d"]),
            )
            .await;
        assert!(matches!(result, Err(ArticleServiceError::InternalError(_))));

        let detail = service.get_by_id(created.id).await.unwrap();
        assert_eq!(detail.article.title, "New");
        assert_eq!(detail.article.content, "changed");
        // a and b were unlinked, c linked, d failed
        assert_eq!(tag_names_of(&detail), vec!["c"]);

        // Retrying with a working store converges
        service
            .update(
                created.id,
                UpdateArticleInput::new("New", "changed"),
                &names(&["c", "d"]),
            )
            .await
            .unwrap();
        assert_eq!(stored_tag_names(&pool, created.id).await, vec!["c", "d"]);
    }

    // ========================================================================
    // Property-Based Tests
    // ========================================================================

    use proptest::prelude::*;

    fn tag_list() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec("[a-e]", 0..6)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Whatever tags an article had before, an update leaves exactly the
        /// distinct requested names linked, and repeating it changes nothing.
        #[test]
        fn property_tag_reconciliation_converges(
            initial in tag_list(),
            requested in tag_list(),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let (pool, service) = setup_test_service().await;

                let article = service
                    .create(CreateArticleInput::new("Prop", "", 1), &initial)
                    .await
                    .expect("create should succeed");

                let mut expected: Vec<String> = requested.clone();
                expected.sort();
                expected.dedup();

                service
                    .update(article.id, UpdateArticleInput::new("Prop", ""), &requested)
                    .await
                    .expect("update should succeed");
                let once = tag_names_of(&service.get_by_id(article.id).await.unwrap());
                prop_assert_eq!(&once, &expected);

                service
                    .update(article.id, UpdateArticleInput::new("Prop", ""), &requested)
                    .await
                    .expect("update should succeed");
                let twice = tag_names_of(&service.get_by_id(article.id).await.unwrap());
                prop_assert_eq!(&twice, &expected);
                prop_assert_eq!(link_count(&pool).await, expected.len() as i64);

                Ok(())
            });
            result?;
        }
    }
}
