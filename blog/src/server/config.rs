//! Command line and YAML configuration for the blog server.

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use common::StorageConfig;
use eventlog::{BroadcastConfig, TailConfig};
use serde::Deserialize;

use crate::{Error, Result};

/// CLI arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "blog")]
#[command(about = "Blog content store with live article notifications")]
pub struct CliArgs {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "BLOG_CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "BLOG_PORT")]
    pub port: u16,

    /// Keep all data in memory, ignoring the configured storage
    #[arg(long)]
    pub in_memory: bool,

    /// Skip seeding the sample users and articles
    #[arg(long)]
    pub no_seed: bool,
}

impl CliArgs {
    /// Loads the configuration file, if any, and applies the CLI overrides.
    pub fn to_blog_config(&self) -> Result<BlogConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => BlogConfig::default(),
        };
        if self.in_memory {
            config.storage = StorageConfig::InMemory;
        }
        if self.no_seed {
            config.seed = false;
        }
        Ok(config)
    }
}

/// Root of the YAML configuration file.
///
/// ```yaml
/// storage:
///   type: SlateDb
///   path: blog
///   object_store:
///     type: Local
///     path: .data
/// log:
///   read_batch_size: 256
/// broadcast:
///   subscriber_capacity: 1024
///   retry_backoff_ms: 100
/// server:
///   sse_keep_alive_secs: 15
/// seed: true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BlogConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogSection,
    #[serde(default)]
    pub broadcast: BroadcastSection,
    #[serde(default)]
    pub server: ServerSection,
    /// Writes the sample users and articles into an empty store on startup.
    #[serde(default = "default_seed")]
    pub seed: bool,
}

fn default_seed() -> bool {
    true
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            log: LogSection::default(),
            broadcast: BroadcastSection::default(),
            server: ServerSection::default(),
            seed: default_seed(),
        }
    }
}

impl BlogConfig {
    pub fn tail_config(&self) -> TailConfig {
        TailConfig {
            read_batch_size: self.log.read_batch_size,
        }
    }

    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            subscriber_capacity: self.broadcast.subscriber_capacity,
            retry_backoff: Duration::from_millis(self.broadcast.retry_backoff_ms),
        }
    }
}

/// Event log tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    #[serde(default = "default_read_batch_size")]
    pub read_batch_size: usize,
}

fn default_read_batch_size() -> usize {
    TailConfig::default().read_batch_size
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            read_batch_size: default_read_batch_size(),
        }
    }
}

/// Broadcaster tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastSection {
    #[serde(default = "default_subscriber_capacity")]
    pub subscriber_capacity: usize,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_subscriber_capacity() -> usize {
    BroadcastConfig::default().subscriber_capacity
}

fn default_retry_backoff_ms() -> u64 {
    BroadcastConfig::default().retry_backoff.as_millis() as u64
}

impl Default for BroadcastSection {
    fn default() -> Self {
        Self {
            subscriber_capacity: default_subscriber_capacity(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// HTTP server tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Interval between SSE keep-alive comments on idle notification streams.
    #[serde(default = "default_sse_keep_alive_secs")]
    pub sse_keep_alive_secs: u64,
}

fn default_sse_keep_alive_secs() -> u64 {
    15
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            sse_keep_alive_secs: default_sse_keep_alive_secs(),
        }
    }
}

/// Settings the [`BlogServer`](super::BlogServer) itself needs.
#[derive(Debug, Clone)]
pub struct BlogServerConfig {
    pub port: u16,
    pub sse_keep_alive: Duration,
}

impl BlogServerConfig {
    pub fn new(args: &CliArgs, config: &BlogConfig) -> Self {
        Self {
            port: args.port,
            sse_keep_alive: Duration::from_secs(config.server.sse_keep_alive_secs),
        }
    }
}

/// Load the blog configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BlogConfig> {
    let contents = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::InvalidInput(format!("Failed to read config file: {}", e)))?;

    serde_yaml::from_str(&contents)
        .map_err(|e| Error::InvalidInput(format!("Failed to parse config file: {}", e)))
}
