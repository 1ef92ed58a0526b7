//! Content records and the event payload published for new articles.
//!
//! All records serialize with camelCase field names (`addedAt`), which is
//! both their storage encoding and their HTTP representation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A blog author, keyed by `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub login: String,
    pub firstname: String,
    pub lastname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl User {
    pub fn new(
        login: impl Into<String>,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
    ) -> Self {
        Self {
            login: login.into(),
            firstname: firstname.into(),
            lastname: lastname.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Placeholder for an author login with no stored user.
    pub(crate) fn unknown(login: &str) -> Self {
        Self::new(login, "", "")
    }
}

/// An article, keyed by `slug`. `author` holds the author's login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub slug: String,
    pub title: String,
    pub headline: String,
    pub content: String,
    pub author: String,
    pub added_at: NaiveDateTime,
}

/// An article with its author resolved to the full [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub headline: String,
    pub content: String,
    pub author: User,
    pub added_at: NaiveDateTime,
}

impl Post {
    pub fn new(article: Article, author: User) -> Self {
        Self {
            slug: article.slug,
            title: article.title,
            headline: article.headline,
            content: article.content,
            author,
            added_at: article.added_at,
        }
    }
}

/// Payload of the event appended to the log when an article is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleEvent {
    pub slug: String,
    pub title: String,
}

impl From<&Article> for ArticleEvent {
    fn from(article: &Article) -> Self {
        Self {
            slug: article.slug.clone(),
            title: article.title.clone(),
        }
    }
}

/// Derives a URL slug from a title.
///
/// Lowercases the title and collapses every run of non-alphanumeric
/// characters into a single `-`, with no leading or trailing dash.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
