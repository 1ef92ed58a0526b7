//! HTTP route handlers for the blog server.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::IntoResponse;
use eventlog::Broadcaster;

use super::error::ApiError;
use super::metrics::Metrics;
use super::request::{ConverterParams, SaveArticleRequest};
use super::session::NotificationSession;
use crate::markdown::Converter;
use crate::model::{Article, Post, User};
use crate::{Blog, Error};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<Blog>,
    pub broadcaster: Arc<Broadcaster>,
    pub metrics: Arc<Metrics>,
    pub sse_keep_alive: Duration,
}

/// Handle GET /api/article/
pub async fn handle_list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Article>>, ApiError> {
    Ok(Json(state.blog.find_all_articles().await?))
}

/// Handle GET /api/article/{slug}
///
/// The converter is checked before the lookup, so an unsupported converter
/// fails even for unknown slugs.
pub async fn handle_get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ConverterParams>,
) -> Result<Json<Article>, ApiError> {
    let converter = Converter::from_param(params.converter.as_deref())?;
    let article = state
        .blog
        .find_article(&slug)
        .await?
        .ok_or_else(|| Error::NotFound(format!("article '{}'", slug)))?;
    Ok(Json(match converter {
        Some(converter) => converter.apply_to_article(article),
        None => article,
    }))
}

/// Handle POST /api/article/
///
/// Saves the article and publishes its event. Responds with the saved
/// article.
pub async fn handle_save_article(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Article>, ApiError> {
    let article = SaveArticleRequest::from_body(&body)?.into_article()?;
    let offset = state.blog.save_article(&article).await?;
    state.metrics.events_appended_total.inc();
    tracing::info!(slug = %article.slug, offset, "Saved article");
    Ok(Json(article))
}

/// Handle DELETE /api/article/{slug}
pub async fn handle_delete_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.blog.delete_article(&slug).await?;
    Ok(StatusCode::OK)
}

/// Handle GET /api/article/notifications
///
/// Streams every article saved after the client connected.
pub async fn handle_notifications(State(state): State<AppState>) -> impl IntoResponse {
    let session = NotificationSession::new(state.broadcaster.attach(), state.metrics.clone());
    Sse::new(session.into_stream()).keep_alive(KeepAlive::new().interval(state.sse_keep_alive))
}

/// Handle GET /api/post/
pub async fn handle_list_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.blog.find_all_posts().await?))
}

/// Handle GET /api/post/{slug}
pub async fn handle_get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ConverterParams>,
) -> Result<Json<Post>, ApiError> {
    let converter = Converter::from_param(params.converter.as_deref())?;
    let post = state
        .blog
        .find_post(&slug)
        .await?
        .ok_or_else(|| Error::NotFound(format!("post '{}'", slug)))?;
    Ok(Json(match converter {
        Some(converter) => converter.apply_to_post(post),
        None => post,
    }))
}

/// Handle GET /api/user/
pub async fn handle_list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.blog.find_all_users().await?))
}

/// Handle GET /api/user/{login}
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(login): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .blog
        .find_user(&login)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user '{}'", login)))?;
    Ok(Json(user))
}

/// Handle GET /metrics
pub async fn handle_metrics(State(state): State<AppState>) -> String {
    state.metrics.encode()
}

/// Handle GET /-/healthy
pub async fn handle_healthy() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Handle GET /-/ready
///
/// Not ready once the event log has been closed.
pub async fn handle_ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.blog.events().is_closed() {
        (StatusCode::SERVICE_UNAVAILABLE, "Closed")
    } else {
        (StatusCode::OK, "OK")
    }
}
