//! Command processor: pending queue, run loop and timeouts.
//!
//! The processor owns the write half of the gateway connection and a
//! bounded queue of submitted commands. Command execution is strictly
//! serialized: one command is `Processing` at any instant, and the
//! next pending command is not dequeued until the current one reaches
//! a terminal state. A dedicated reader task (see
//! [`crate::transport::spawn_frame_reader`]) feeds validated frames in
//! arrival order; the run loop matches each against the active command
//! and discards the rest.
//!
//! ```text
//! Caller 1 ─┐                                       frames
//! Caller 2 ─┼─► mpsc::Sender<Submission> ─► Run loop ◄───── Reader task
//! Caller N ─┘                                  │
//!                                              ▼ oneshot per command
//!                                         CommandHandle
//! ```

use std::marker::PhantomData;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::commands::{codes, GatewayCommand};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::protocol::{encode_frame, slip, Frame};

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pending-queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Bounded wait for a command's terminal frame.
    pub command_timeout: Duration,
    /// Capacity of the pending command queue.
    pub queue_capacity: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl From<&GatewayConfig> for ProcessorConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            command_timeout: config.command_timeout(),
            queue_capacity: config.queue_capacity,
        }
    }
}

/// A queued unit of work, or the run loop's poison pill.
enum Submission {
    Execute(InFlight),
    Shutdown,
}

struct InFlight {
    command: Box<dyn GatewayCommand>,
    done: oneshot::Sender<Box<dyn GatewayCommand>>,
}

/// Typed handle to a submitted command.
///
/// Resolves once the command reaches `Complete` or `Error`; the
/// command value, with its accumulated results and final status, is
/// handed back to the caller. The engine never touches it again.
pub struct CommandHandle<C> {
    rx: oneshot::Receiver<Box<dyn GatewayCommand>>,
    _kind: PhantomData<fn() -> C>,
}

impl<C: GatewayCommand> CommandHandle<C> {
    /// Wait for the command to reach a terminal state and take it back.
    ///
    /// Errors only when the engine went away before retiring the
    /// command (connection teardown or shutdown); protocol-level
    /// failures are reported through the returned command's status.
    pub async fn finished(self) -> Result<C> {
        let boxed = self
            .rx
            .await
            .map_err(|_| GatewayError::ConnectionClosed)?;
        let command = boxed
            .into_any()
            .downcast::<C>()
            .expect("handle was minted together with this command");
        Ok(*command)
    }
}

/// Cheaply cloneable submission side of the engine.
#[derive(Clone)]
pub struct ProcessorHandle {
    tx: mpsc::Sender<Submission>,
}

impl ProcessorHandle {
    /// Validate and enqueue a command.
    ///
    /// Validation failures reject the command before it is queued; no
    /// protocol exchange occurs. Enqueueing never blocks: a full queue
    /// is reported as [`GatewayError::QueueFull`].
    pub fn submit<C: GatewayCommand>(&self, mut command: C) -> Result<CommandHandle<C>> {
        command.validate()?;
        command.state_mut().mark_queued();

        let (done, rx) = oneshot::channel();
        let inflight = InFlight {
            command: Box::new(command),
            done,
        };
        self.tx
            .try_send(Submission::Execute(inflight))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => GatewayError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => GatewayError::ConnectionClosed,
            })?;
        Ok(CommandHandle {
            rx,
            _kind: PhantomData,
        })
    }

    /// Ask the run loop to stop once the current command retires.
    /// Commands still pending behind the shutdown are dropped, which
    /// resolves their handles with [`GatewayError::ConnectionClosed`].
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Submission::Shutdown).await;
    }
}

/// The engine. Owns the transport's write half exclusively.
pub struct CommandProcessor<W> {
    writer: W,
    frames: mpsc::Receiver<Frame>,
    queue: mpsc::Receiver<Submission>,
    config: ProcessorConfig,
    frames_closed: bool,
}

impl<W: AsyncWrite + Unpin + Send + 'static> CommandProcessor<W> {
    /// Build an engine over a write half and a validated-frame source.
    pub fn new(
        writer: W,
        frames: mpsc::Receiver<Frame>,
        config: ProcessorConfig,
    ) -> (Self, ProcessorHandle) {
        let (tx, queue) = mpsc::channel(config.queue_capacity);
        let processor = Self {
            writer,
            frames,
            queue,
            config,
            frames_closed: false,
        };
        (processor, ProcessorHandle { tx })
    }

    /// Spawn the run loop onto the runtime.
    pub fn spawn(
        writer: W,
        frames: mpsc::Receiver<Frame>,
        config: ProcessorConfig,
    ) -> (ProcessorHandle, JoinHandle<()>) {
        let (processor, handle) = Self::new(writer, frames, config);
        let task = tokio::spawn(processor.run());
        (handle, task)
    }

    /// Drive the queue until shutdown or until every submitter is gone.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                submission = self.queue.recv() => match submission {
                    None => break,
                    Some(Submission::Shutdown) => {
                        debug!("shutdown requested, stopping run loop");
                        break;
                    }
                    Some(Submission::Execute(inflight)) => self.execute(inflight).await,
                },
                frame = self.frames.recv(), if !self.frames_closed => match frame {
                    // No command is active: unsolicited gateway traffic.
                    Some(frame) => log_unmatched(&frame, "idle"),
                    None => {
                        warn!("frame stream closed while idle");
                        self.frames_closed = true;
                    }
                },
            }
        }
    }

    async fn execute(&mut self, mut inflight: InFlight) {
        let name = inflight.command.spec().name;
        inflight.command.state_mut().mark_processing();
        debug!(command = name, "processing");

        let sent = match self.prepare(inflight.command.as_ref()) {
            Ok(wire) => self.transmit(&wire).await,
            Err(err) => Err(err),
        };
        match sent {
            Ok(()) => self.await_responses(inflight.command.as_mut()).await,
            Err(err) => inflight
                .command
                .state_mut()
                .fail(format!("request not sent: {err}")),
        }

        debug!(
            command = name,
            status = ?inflight.command.state().status(),
            "retired"
        );
        // Receiver may have been dropped by an impatient caller.
        let _ = inflight.done.send(inflight.command);
    }

    fn prepare(&self, command: &dyn GatewayCommand) -> Result<Vec<u8>> {
        if self.frames_closed {
            return Err(GatewayError::ConnectionClosed);
        }
        let payload = command.build_request_payload()?;
        let frame = encode_frame(command.spec().request_code, &payload)?;
        Ok(slip::wrap(&frame))
    }

    async fn transmit(&mut self, wire: &[u8]) -> Result<()> {
        self.writer.write_all(wire).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Feed inbound frames to the active command until it reaches a
    /// terminal state, the per-command deadline passes, or the
    /// connection goes away.
    async fn await_responses(&mut self, command: &mut dyn GatewayCommand) {
        let deadline = Instant::now() + self.config.command_timeout;

        while !command.state().is_terminal() {
            match timeout_at(deadline, self.frames.recv()).await {
                Err(_) => {
                    command
                        .state_mut()
                        .fail("timed out awaiting terminal response");
                }
                Ok(None) => {
                    self.frames_closed = true;
                    command.state_mut().fail("connection closed");
                }
                Ok(Some(frame)) => {
                    if command.can_handle_response(frame.command_code(), frame.payload()) {
                        command.handle_response(frame.command_code(), frame.payload());
                    } else {
                        log_unmatched(&frame, command.spec().name);
                    }
                }
            }
        }
    }
}

fn log_unmatched(frame: &Frame, context: &str) {
    if frame.command_code() == codes::GW_ERROR_NTF {
        warn!(
            error_code = frame.payload().first().copied().unwrap_or(0),
            "gateway error notification"
        );
    } else {
        debug!(
            code = format_args!("{:#06x}", frame.command_code()),
            context, "discarding unmatched frame"
        );
    }
}
