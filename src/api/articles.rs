//! Article API endpoints
//!
//! Handles HTTP requests for article management:
//! - POST /api/v1/articles - Create article
//! - GET /api/v1/articles - List articles with pagination
//! - GET /api/v1/articles/search - Search articles
//! - GET /api/v1/articles/{id} - Get article with tags and media
//! - PUT /api/v1/articles/{id} - Update article and reconcile tags
//! - DELETE /api/v1/articles/{id} - Archive article

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{parse_id, ApiError, AppState};
use crate::api::tags::TagResponse;
use crate::models::{
    Article, ArticleStatus, CreateArticleInput, ListParams, UpdateArticleInput,
    DEFAULT_LIST_LIMIT,
};
use crate::services::ArticleDetail;

/// Creator recorded on new articles until authentication exists
pub const DEFAULT_CREATOR_ID: i64 = 1;

/// Query parameters for listing articles
#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

/// Response for article list
#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleResponse>,
    pub limit: i64,
    pub offset: i64,
}

/// Response for search
#[derive(Debug, Serialize)]
pub struct ArticleSearchResponse {
    pub articles: Vec<ArticleResponse>,
}

/// Response for a single article
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: String,
    pub created_by: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            content: article.content,
            status: article.status.to_string(),
            created_by: article.created_by,
            created_at: article.created_at.to_rfc3339(),
            updated_at: article.updated_at.to_rfc3339(),
        }
    }
}

/// Response for GET /articles/{id}
#[derive(Debug, Serialize)]
pub struct ArticleDetailResponse {
    pub article: ArticleResponse,
    pub tags: Vec<TagResponse>,
    pub media: Vec<crate::models::MediaFile>,
}

impl From<ArticleDetail> for ArticleDetailResponse {
    fn from(detail: ArticleDetail) -> Self {
        Self {
            article: detail.article.into(),
            tags: detail.tags.into_iter().map(Into::into).collect(),
            media: detail.media,
        }
    }
}

/// Response for a successful create
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

/// Response for a successful update
#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub status: &'static str,
    pub article: ArticleResponse,
}

/// Response for a successful archive
#[derive(Debug, Serialize)]
pub struct ArchivedResponse {
    pub status: &'static str,
}

/// Request body for creating or updating an article
#[derive(Debug, Deserialize)]
pub struct ArticleRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ArticleRequest {
    fn parsed_status(&self) -> Result<Option<ArticleStatus>, ApiError> {
        self.status.as_deref().map(parse_status).transpose()
    }
}

fn parse_status(raw: &str) -> Result<ArticleStatus, ApiError> {
    ArticleStatus::from_str(raw).ok_or_else(|| {
        ApiError::with_details(
            "VALIDATION_ERROR",
            format!("Invalid status: {}", raw),
            serde_json::json!({
                "field": "status",
                "allowed": ["draft", "published", "deprecated"],
            }),
        )
    })
}

/// Build the articles router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_articles).post(create_article))
        .route("/search", get(search_articles))
        .route(
            "/{id}",
            get(get_article).put(update_article).delete(archive_article),
        )
        .route("/{id}/media", axum::routing::post(crate::api::media::attach_media))
}

/// POST /api/v1/articles - Create new article
pub async fn create_article(
    State(state): State<AppState>,
    Json(body): Json<ArticleRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let status = body.parsed_status()?;

    let mut input = CreateArticleInput::new(body.title, body.content, DEFAULT_CREATOR_ID);
    if let Some(status) = status {
        input = input.with_status(status);
    }

    let article = state.article_service.create(input, &body.tags).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: article.id })))
}

/// GET /api/v1/articles - List articles with pagination
///
/// `limit` is clamped to 1..=100 and a negative `offset` is treated as 0.
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> Result<Json<ArticleListResponse>, ApiError> {
    let params = ListParams::new(query.limit, query.offset);

    let articles = state.article_service.list(&params).await?;

    Ok(Json(ArticleListResponse {
        articles: articles.into_iter().map(Into::into).collect(),
        limit: params.limit,
        offset: params.offset,
    }))
}

/// GET /api/v1/articles/search?q=..&tag=..&tag=..&status=..
///
/// Every parameter is optional. Repeated `tag` parameters are combined with
/// AND semantics.
pub async fn search_articles(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ArticleSearchResponse>, ApiError> {
    let mut q = String::new();
    let mut tags = Vec::new();
    let mut status = None;

    for (key, value) in pairs {
        match key.as_str() {
            "q" => q = value,
            "tag" => tags.push(value),
            "status" if !value.is_empty() => status = Some(parse_status(&value)?),
            _ => {}
        }
    }

    let articles = state.article_service.search(&q, &tags, status).await?;

    Ok(Json(ArticleSearchResponse {
        articles: articles.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/articles/{id} - Article with its tags and media
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArticleDetailResponse>, ApiError> {
    let id = parse_id(&id)?;

    let detail = state.article_service.get_by_id(id).await?;

    Ok(Json(detail.into()))
}

/// PUT /api/v1/articles/{id} - Update article
///
/// The `tags` list replaces the article's tags; omitting it removes them all.
pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ArticleRequest>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let id = parse_id(&id)?;
    let status = body.parsed_status()?;

    let mut input = UpdateArticleInput::new(body.title, body.content);
    if let Some(status) = status {
        input = input.with_status(status);
    }

    let article = state.article_service.update(id, input, &body.tags).await?;

    Ok(Json(UpdatedResponse {
        status: "updated",
        article: article.into(),
    }))
}

/// DELETE /api/v1/articles/{id} - Archive article
///
/// The row is kept with status `deprecated`.
pub async fn archive_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchivedResponse>, ApiError> {
    let id = parse_id(&id)?;

    state.article_service.archive(id).await?;

    Ok(Json(ArchivedResponse { status: "archived" }))
}
