//! Gateway client: connection lifecycle glue.
//!
//! Ties the transport, reader task and command processor together:
//! 1. Connect (TCP) or adopt an existing byte stream
//! 2. Spawn the frame reader over the read half
//! 3. Spawn the command processor over the write half
//! 4. Run the password exchange
//!
//! # Example
//!
//! ```ignore
//! use klf200_client::{GatewayClient, GatewayConfig};
//! use klf200_client::commands::{GetAllNodes, SendCommand};
//! use klf200_client::SessionAllocator;
//!
//! #[tokio::main]
//! async fn main() -> klf200_client::Result<()> {
//!     let mut config = GatewayConfig::for_host("192.168.1.50");
//!     config.password = "velux123".into();
//!
//!     let client = GatewayClient::connect(&config).await?;
//!
//!     let nodes = client.submit(GetAllNodes::new())?.finished().await?;
//!     for node in nodes.nodes() {
//!         println!("{}: {}", node.id, node.name);
//!     }
//!
//!     let sessions = SessionAllocator::new();
//!     let open = SendCommand::new(&sessions, vec![(3, 0x0000)]);
//!     client.submit(open)?.finished().await?;
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::commands::{GatewayCommand, Login};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::processor::{CommandHandle, CommandProcessor, ProcessorConfig, ProcessorHandle};
use crate::transport::{self, spawn_frame_reader};

/// A connected, authenticated gateway client.
pub struct GatewayClient {
    handle: ProcessorHandle,
    engine: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl GatewayClient {
    /// Connect over TCP and authenticate.
    pub async fn connect(config: &GatewayConfig) -> Result<Self> {
        let stream = transport::connect(config).await?;
        let (read_half, write_half) = stream.into_split();
        Self::start(read_half, write_half, config).await
    }

    /// Start the engine over an arbitrary byte stream pair.
    ///
    /// Runs the password exchange when `config.password` is non-empty;
    /// a rejected password tears the client down with
    /// [`GatewayError::Rejected`].
    pub async fn start<R, W>(reader: R, writer: W, config: &GatewayConfig) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (frames, reader_task) = spawn_frame_reader(reader, config.queue_capacity);
        let (handle, engine) =
            CommandProcessor::spawn(writer, frames, ProcessorConfig::from(config));

        let client = Self {
            handle,
            engine,
            reader: reader_task,
        };

        if !config.password.is_empty() {
            let login = client
                .handle
                .submit(Login::new(config.password.clone()))?
                .finished()
                .await?;
            if let Some(detail) = login.state().error_detail() {
                let detail = detail.to_string();
                client.shutdown().await;
                return Err(GatewayError::Rejected(detail));
            }
            debug!("gateway accepted password");
        }

        Ok(client)
    }

    /// Submit a command for execution.
    pub fn submit<C: GatewayCommand>(&self, command: C) -> Result<CommandHandle<C>> {
        self.handle.submit(command)
    }

    /// A cloneable submission handle, for sharing across tasks.
    pub fn handle(&self) -> ProcessorHandle {
        self.handle.clone()
    }

    /// Stop the engine and tear down the reader task.
    pub async fn shutdown(self) {
        self.handle.shutdown().await;
        let _ = self.engine.await;
        self.reader.abort();
    }
}
