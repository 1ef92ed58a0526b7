//! Blog HTTP server binary entry point.

use std::sync::Arc;

use blog::Blog;
use blog::seed::seed;
use blog::server::{BlogServer, BlogServerConfig, CliArgs};
use clap::Parser;
use common::storage::factory::create_storage;
use eventlog::Broadcaster;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    let config = args.to_blog_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });
    let server_config = BlogServerConfig::new(&args, &config);

    tracing::info!("Creating storage with config: {:?}", config.storage);
    let storage = create_storage(&config.storage).await.unwrap_or_else(|e| {
        tracing::error!("Failed to create storage: {}", e);
        std::process::exit(1);
    });

    let blog = Blog::open(storage, config.tail_config())
        .await
        .expect("Failed to open blog");

    if config.seed {
        match seed(&blog).await {
            Ok(true) => tracing::info!("Seeded sample users and articles"),
            Ok(false) => tracing::info!("Store already populated, skipping seed"),
            Err(e) => {
                tracing::error!("Failed to seed store: {}", e);
                std::process::exit(1);
            }
        }
    }

    let broadcaster = Broadcaster::start(blog.events(), config.broadcast_config())
        .expect("Failed to start broadcaster");

    let server = BlogServer::new(Arc::new(blog), Arc::new(broadcaster), server_config);
    if let Err(e) = server.run().await {
        tracing::error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
