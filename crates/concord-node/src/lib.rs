//! Concord Node - Consensus Engine Daemon
//!
//! Hosts a single [`concord_core::Engine`] and exposes it to the chat
//! command layer and the voting layer over a Unix socket.
//!
//! # Architecture
//!
//! - **Node**: configuration and lifecycle (load on start, flush on stop)
//! - **Gateway**: line-delimited JSON requests, one engine event at a time
//! - **concord-admin**: CLI client for driving a node by hand
//!
//! # Example
//!
//! ```no_run
//! use concord_node::{ConcordNode, NodeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::default();
//!     let node = ConcordNode::new(config)?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod gateway;
pub mod node;

pub use gateway::{Request, Response};
pub use node::{ConcordNode, NodeConfig};
