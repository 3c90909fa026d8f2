//! Concord Node - the daemon entry point.
//!
//! Architecture:
//! - One engine owning every project, loaded from disk at startup
//! - Unix socket gateway for the chat command and voting layers
//! - Full flush of every project on shutdown

use crate::gateway::{self, Event};
use concord_core::{Engine, Result, Storage, Store};
use std::path::PathBuf;

/// Configuration for a Concord node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// Gateway socket path
    pub socket: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(
            std::env::var("CONCORD_DATA_DIR").unwrap_or_else(|_| "./concord-data".to_string()),
        );

        let socket = std::env::var("CONCORD_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("concord.sock"));

        Self { data_dir, socket }
    }
}

/// A Concord node instance.
pub struct ConcordNode {
    engine: Engine,
    config: NodeConfig,
}

impl ConcordNode {
    /// Create a node, loading every persisted project.
    pub fn new(config: NodeConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let storage = Storage::open(&config.data_dir)?;
        let engine = Engine::new(Store::load(storage)?);

        Ok(Self { engine, config })
    }

    /// The engine, before the node starts serving.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Serve the gateway until Ctrl-C, then flush everything to disk.
    pub async fn run(self) -> Result<()> {
        tracing::info!("Concord node starting");
        tracing::info!("  Gateway: {:?}", self.config.socket);
        tracing::info!("  Data: {:?}", self.config.data_dir);

        let (events, engine_task) = gateway::spawn_engine(self.engine);
        let listener = gateway::bind(&self.config.socket)?;

        tokio::select! {
            _ = gateway::serve(listener, events.clone()) => {}
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                }
                tracing::info!("Shutting down");
            }
        }

        // requests already queued are handled before the engine stops
        let _ = events.send(Event::Shutdown).await;
        let engine = engine_task.await.map_err(std::io::Error::other)?;
        engine.flush()?;

        let _ = std::fs::remove_file(&self.config.socket);
        Ok(())
    }
}
