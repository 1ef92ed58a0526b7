//! HTTP request types for the blog server.

use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;

use crate::Error;
use crate::model::{Article, slugify};

/// Query parameters accepted by the single article and post endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ConverterParams {
    /// Output converter for headline and content (only `markdown`).
    pub converter: Option<String>,
}

/// Body of `POST /api/article/`.
///
/// `slug` defaults to the slugified title and `addedAt` to the current time.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveArticleRequest {
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub added_at: Option<NaiveDateTime>,
}

impl SaveArticleRequest {
    /// Parses and validates a JSON request body.
    pub fn from_body(body: &[u8]) -> Result<Self, Error> {
        let request: SaveArticleRequest = serde_json::from_slice(body)
            .map_err(|e| Error::InvalidInput(format!("Invalid article JSON: {}", e)))?;
        if request.title.trim().is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }
        if request.author.trim().is_empty() {
            return Err(Error::InvalidInput("author must not be empty".to_string()));
        }
        Ok(request)
    }

    pub fn into_article(self) -> Result<Article, Error> {
        let slug = match self.slug {
            Some(slug) if !slug.is_empty() => slug,
            _ => slugify(&self.title),
        };
        if slug.is_empty() {
            return Err(Error::InvalidInput(format!(
                "cannot derive a slug from title '{}'",
                self.title
            )));
        }
        Ok(Article {
            slug,
            title: self.title,
            headline: self.headline,
            content: self.content,
            author: self.author,
            added_at: self.added_at.unwrap_or_else(|| Utc::now().naive_utc()),
        })
    }
}
