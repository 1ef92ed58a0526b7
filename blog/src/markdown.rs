//! Markdown rendering for article text.

use pulldown_cmark::{Options, Parser, html};

use crate::error::{Error, Result};
use crate::model::{Article, Post};

/// Renders CommonMark text to HTML.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(text, options);

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Output converters selectable with the `converter` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    Markdown,
}

impl Converter {
    /// Parses the optional `converter` parameter.
    ///
    /// Returns `Ok(None)` when no converter was requested.
    pub fn from_param(param: Option<&str>) -> Result<Option<Self>> {
        match param {
            None => Ok(None),
            Some("markdown") => Ok(Some(Converter::Markdown)),
            Some(_) => Err(Error::Unsupported(
                "Only markdown converter is supported".to_string(),
            )),
        }
    }

    pub fn convert(&self, text: &str) -> String {
        match self {
            Converter::Markdown => render_markdown(text),
        }
    }

    /// Converts an article's headline and content.
    pub fn apply_to_article(&self, article: Article) -> Article {
        Article {
            headline: self.convert(&article.headline),
            content: self.convert(&article.content),
            ..article
        }
    }

    /// Converts a post's headline and content.
    pub fn apply_to_post(&self, post: Post) -> Post {
        Post {
            headline: self.convert(&post.headline),
            content: self.convert(&post.content),
            ..post
        }
    }
}
