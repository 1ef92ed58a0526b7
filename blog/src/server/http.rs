//! HTTP server implementation for the blog.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use eventlog::Broadcaster;
use tokio::signal;
use tower_http::trace::TraceLayer;

use super::config::BlogServerConfig;
use super::handlers::{
    AppState, handle_delete_article, handle_get_article, handle_get_post, handle_get_user,
    handle_healthy, handle_list_articles, handle_list_posts, handle_list_users, handle_metrics,
    handle_notifications, handle_ready, handle_save_article,
};
use super::metrics::Metrics;
use super::middleware::track_metrics;
use crate::Blog;

/// Builds the blog router with its routes and middleware.
pub fn router(state: AppState) -> Router {
    let metrics = state.metrics.clone();
    Router::new()
        .route(
            "/api/article/",
            get(handle_list_articles).post(handle_save_article),
        )
        .route("/api/article/notifications", get(handle_notifications))
        .route(
            "/api/article/{slug}",
            get(handle_get_article).delete(handle_delete_article),
        )
        .route("/api/post/", get(handle_list_posts))
        .route("/api/post/{slug}", get(handle_get_post))
        .route("/api/user/", get(handle_list_users))
        .route("/api/user/{login}", get(handle_get_user))
        .route("/metrics", get(handle_metrics))
        .route("/-/healthy", get(handle_healthy))
        .route("/-/ready", get(handle_ready))
        .layer(from_fn_with_state(metrics, track_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server for the blog.
pub struct BlogServer {
    blog: Arc<Blog>,
    broadcaster: Arc<Broadcaster>,
    config: BlogServerConfig,
}

impl BlogServer {
    pub fn new(blog: Arc<Blog>, broadcaster: Arc<Broadcaster>, config: BlogServerConfig) -> Self {
        Self {
            blog,
            broadcaster,
            config,
        }
    }

    /// Run the HTTP server until SIGINT or SIGTERM.
    ///
    /// On shutdown the broadcaster is stopped first, which ends every open
    /// notification stream, and then the blog's event log is closed.
    pub async fn run(self) -> std::io::Result<()> {
        let state = AppState {
            blog: self.blog.clone(),
            broadcaster: self.broadcaster.clone(),
            metrics: Arc::new(Metrics::new()),
            sse_keep_alive: self.config.sse_keep_alive,
        };
        let app = router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        tracing::info!("Starting blog HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let broadcaster = self.broadcaster.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                // open SSE responses keep graceful shutdown waiting until they end
                broadcaster.shutdown().await;
            })
            .await?;

        if let Err(err) = self.blog.close().await {
            tracing::warn!(error = %err, "Failed to close blog");
        }
        tracing::info!("Server shut down gracefully");
        Ok(())
    }
}

/// Listen for SIGTERM (K8s pod termination) and SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
