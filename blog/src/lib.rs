//! Blog - articles, posts and users with live article notifications.
//!
//! Records are stored through the shared [`common::Storage`] abstraction.
//! Every saved article also appends an [`ArticleEvent`] to an
//! [`eventlog::EventLog`] on the same storage, which the HTTP server fans
//! out to clients connected to the notifications endpoint.
//!
//! # Example
//!
//! ```ignore
//! use blog::{Article, Blog};
//!
//! let blog = Blog::open(storage, TailConfig::default()).await?;
//! let mut cursor = blog.events().tail();
//! blog.save_article(&article).await?;
//!
//! let event = cursor.next().await?;
//! ```

mod blog;
mod error;
mod markdown;
mod model;
mod repository;
pub mod seed;
mod serde;
#[cfg(feature = "http-server")]
pub mod server;

pub use blog::Blog;
pub use error::{Error, Result};
pub use markdown::{Converter, render_markdown};
pub use model::{Article, ArticleEvent, Post, User, slugify};
pub use repository::{ArticleRepository, Entity, Repository, UserRepository};
