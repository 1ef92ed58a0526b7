//! HTTP server for the blog API.

pub mod config;
mod error;
pub mod handlers;
mod http;
pub mod metrics;
mod middleware;
pub mod request;
pub mod session;

pub use config::{BlogConfig, BlogServerConfig, CliArgs, load_config};
pub use error::ApiError;
pub use http::{BlogServer, router};
