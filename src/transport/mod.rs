//! Transport: TCP connection and the dedicated frame reader task.
//!
//! The reader task continuously consumes the inbound byte stream,
//! deframes it through [`FrameBuffer`] and forwards validated frames
//! over an mpsc channel in arrival order. The write half of the
//! connection is owned exclusively by the command processor; nothing
//! else writes to the gateway.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::protocol::{Frame, FrameBuffer};

/// Read buffer size for the reader task.
const READ_BUF_SIZE: usize = 4096;

/// Open a TCP connection to the gateway.
pub async fn connect(config: &GatewayConfig) -> Result<TcpStream> {
    let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
    stream.set_nodelay(true)?;
    debug!(host = %config.host, port = config.port, "connected to gateway");
    Ok(stream)
}

/// Spawn the reader task over any byte source.
///
/// Returns the validated-frame receiver (hand it to
/// [`CommandProcessor`](crate::processor::CommandProcessor)) and the
/// task handle. The task ends on EOF, read error, or when the frame
/// receiver is dropped.
pub fn spawn_frame_reader<R>(reader: R, capacity: usize) -> (mpsc::Receiver<Frame>, JoinHandle<()>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(read_loop(reader, tx));
    (rx, task)
}

async fn read_loop<R>(mut reader: R, tx: mpsc::Sender<Frame>)
where
    R: AsyncRead + Unpin,
{
    let mut buffer = FrameBuffer::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("gateway closed the connection");
                break;
            }
            Ok(n) => n,
            Err(err) => {
                warn!(error = %err, "read from gateway failed");
                break;
            }
        };

        for frame in buffer.push(&buf[..n]) {
            if tx.send(frame).await.is_err() {
                // Engine is gone; nothing left to deliver to.
                return;
            }
        }
    }
}
