//! Article search query builder.
//!
//! Composes the optional status, text and tag filters into a single SQL
//! statement plus an ordered parameter list. Placeholders are `?`, which both
//! SQLite and MySQL accept, so the same output feeds either driver.

use crate::models::ArticleStatus;

/// Escape character used in LIKE patterns. `!` behaves the same on SQLite and
/// MySQL, unlike backslash.
const LIKE_ESCAPE: char = '!';

const ARTICLE_COLUMNS: &str = "articles.id, articles.title, articles.content, articles.status, \
     articles.created_by, articles.created_at, articles.updated_at";

/// Type-safe parameter binding for search queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// String parameter.
    Text(String),
    /// Integer parameter.
    Int(i64),
}

/// Filters for an article search. Every filter is optional and they combine
/// with AND.
#[derive(Debug, Clone, Default)]
pub struct ArticleSearch<'a> {
    /// Case-insensitive substring of title or content; empty means no filter
    pub query: &'a str,
    /// Articles must carry every one of these tags; empty means no filter
    pub tags: &'a [String],
    /// Exact status match
    pub status: Option<ArticleStatus>,
}

impl<'a> ArticleSearch<'a> {
    pub fn new(query: &'a str, tags: &'a [String], status: Option<ArticleStatus>) -> Self {
        Self {
            query,
            tags,
            status,
        }
    }

    /// Build the SQL and the parameters in the order they appear.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(status) = self.status {
            clauses.push("articles.status = ?".to_string());
            params.push(QueryParam::Text(status.as_str().to_string()));
        }

        // Matched against the *_lower columns, which are folded with
        // str::to_lowercase on write; SQL LOWER() only folds ASCII on SQLite
        if !self.query.is_empty() {
            let pattern = format!("%{}%", escape_like(&self.query.to_lowercase()));
            clauses.push(format!(
                "(articles.title_lower LIKE ? ESCAPE '{0}' OR articles.content_lower LIKE ? ESCAPE '{0}')",
                LIKE_ESCAPE
            ));
            params.push(QueryParam::Text(pattern.clone()));
            params.push(QueryParam::Text(pattern));
        }

        let tags = distinct_tags(self.tags);

        let mut sql = format!("SELECT {} FROM articles", ARTICLE_COLUMNS);

        if !tags.is_empty() {
            sql.push_str(
                " INNER JOIN article_tags ON article_tags.article_id = articles.id \
                 INNER JOIN tags ON tags.id = article_tags.tag_id",
            );

            let placeholders = vec!["?"; tags.len()].join(", ");
            clauses.push(format!("tags.name IN ({})", placeholders));
            params.extend(tags.iter().map(|t| QueryParam::Text((*t).to_string())));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        // AND semantics: an article qualifies only if it matched every distinct tag
        if !tags.is_empty() {
            sql.push_str(" GROUP BY articles.id HAVING COUNT(DISTINCT tags.id) = ?");
            params.push(QueryParam::Int(tags.len() as i64));
        }

        sql.push_str(" ORDER BY articles.id ASC");

        (sql, params)
    }
}

/// Deduplicate tag names, keeping first-seen order.
fn distinct_tags(tags: &[String]) -> Vec<&str> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if !seen.contains(&tag.as_str()) {
            seen.push(tag.as_str());
        }
    }
    seen
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}
