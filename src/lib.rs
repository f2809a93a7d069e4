//! # klf200-client
//!
//! Async client engine for the KLF200 gateway protocol: a binary,
//! checksum-framed, session-correlated request/response protocol used
//! to control and query motorized window, blind and shutter actuators.
//!
//! ## Architecture
//!
//! - **Protocol**: SLIP-escaped (RFC 1055), XOR-checksummed frames
//!   carrying a 16-bit command code and up to 250 payload bytes.
//! - **Commands**: each exchange is a small state machine — one
//!   confirmation, zero or more notifications, a terminal message —
//!   correlated by session identifier or by node identifier depending
//!   on the command kind.
//! - **Engine**: a single connection multiplexes many logical
//!   commands; execution is strictly serialized, one command active at
//!   a time, with per-command timeouts.
//!
//! ## Example
//!
//! ```ignore
//! use klf200_client::{GatewayClient, GatewayConfig};
//! use klf200_client::commands::GetAllNodes;
//!
//! #[tokio::main]
//! async fn main() -> klf200_client::Result<()> {
//!     let mut config = GatewayConfig::for_host("192.168.1.50");
//!     config.password = "velux123".into();
//!
//!     let client = GatewayClient::connect(&config).await?;
//!     let nodes = client.submit(GetAllNodes::new())?.finished().await?;
//!     println!("{} nodes", nodes.nodes().len());
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod processor;
pub mod protocol;
pub mod session;
pub mod transport;

mod client;

pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use error::{FrameError, GatewayError, Result};
pub use processor::{CommandHandle, CommandProcessor, ProcessorConfig, ProcessorHandle};
pub use session::{SessionAllocator, SessionId};
