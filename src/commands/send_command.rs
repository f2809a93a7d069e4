//! Drive actuators to a target position.
//!
//! The only session-correlated command in the catalogue: the request
//! carries a freshly-minted session identifier and every response
//! echoes it back at payload offset 0, which is how responses find
//! their way to this command even while unrelated gateway traffic is
//! on the wire.
//!
//! Request layout (66 bytes):
//!
//! ```text
//! 0..2    session id (u16 BE)
//! 2       command originator
//! 3       priority level
//! 4       function parameter selector (0 = main parameter)
//! 5       target count
//! 6..66   20 fixed slots, 3 bytes each: node id, position (u16 BE)
//! ```
//!
//! Exchange: confirmation (accept/reject) → zero or more run-status
//! and remaining-time notifications (informational, recorded but not
//! status-changing) → a session-finished notification → Complete.

use std::any::Any;

use crate::error::{GatewayError, Result};
use crate::protocol::CommandCode;
use crate::session::{SessionAllocator, SessionId};

use super::{codes, read_u16_be, read_u8, CommandSpec, CommandState, GatewayCommand, NodeId};

/// Number of fixed (node, position) slots in the request.
pub const MAX_TARGETS: usize = 20;

/// Command originator tag for a user-initiated request.
pub const ORIGINATOR_USER: u8 = 1;

/// Default priority level for user commands.
pub const PRIORITY_USER: u8 = 3;

static SPEC: CommandSpec = CommandSpec {
    name: "send-command",
    request_code: codes::GW_COMMAND_SEND_REQ,
    response_codes: &[
        codes::GW_COMMAND_SEND_CFM,
        codes::GW_COMMAND_RUN_STATUS_NTF,
        codes::GW_COMMAND_REMAINING_TIME_NTF,
        codes::GW_SESSION_FINISHED_NTF,
    ],
    requires_session: true,
    node_specific: false,
};

/// A run-status notification snapshot.
///
/// Payload layout: session(0..2), node(2), parameter(3),
/// value(4..6), run status(6), status reply(7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatusEvent {
    pub node: NodeId,
    pub parameter: u8,
    pub value: u16,
    pub run_status: u8,
    pub reply: u8,
}

/// A remaining-time notification snapshot.
///
/// Payload layout: session(0..2), node(2), parameter(3), seconds(4..6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemainingTime {
    pub node: NodeId,
    pub parameter: u8,
    pub seconds: u16,
}

/// Move one or more actuators to a target position.
#[derive(Debug)]
pub struct SendCommand {
    session: SessionId,
    originator: u8,
    priority: u8,
    parameter: u8,
    targets: Vec<(NodeId, u16)>,
    accepted: bool,
    run_events: Vec<RunStatusEvent>,
    remaining_times: Vec<RemainingTime>,
    state: CommandState,
}

impl SendCommand {
    /// Build a command driving `targets` (node, position) pairs, minting
    /// a session identifier from `sessions`.
    pub fn new(sessions: &SessionAllocator, targets: Vec<(NodeId, u16)>) -> Self {
        Self {
            session: sessions.allocate(),
            originator: ORIGINATOR_USER,
            priority: PRIORITY_USER,
            parameter: 0,
            targets,
            accepted: false,
            run_events: Vec::new(),
            remaining_times: Vec::new(),
            state: CommandState::new(),
        }
    }

    /// Override the command originator tag.
    pub fn with_originator(mut self, originator: u8) -> Self {
        self.originator = originator;
        self
    }

    /// Override the priority level.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Select a functional parameter other than the main parameter.
    pub fn with_parameter(mut self, parameter: u8) -> Self {
        self.parameter = parameter;
        self
    }

    /// Whether the gateway's confirmation accepted the request.
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Run-status notifications received so far, in arrival order.
    pub fn run_events(&self) -> &[RunStatusEvent] {
        &self.run_events
    }

    /// Remaining-time notifications received so far, in arrival order.
    pub fn remaining_times(&self) -> &[RemainingTime] {
        &self.remaining_times
    }
}

impl GatewayCommand for SendCommand {
    fn spec(&self) -> &'static CommandSpec {
        &SPEC
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    fn session_id(&self) -> Option<SessionId> {
        Some(self.session)
    }

    fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(GatewayError::Validation(
                "at least one target node is required".into(),
            ));
        }
        if self.targets.len() > MAX_TARGETS {
            return Err(GatewayError::Validation(format!(
                "{} targets exceed the {} fixed slots",
                self.targets.len(),
                MAX_TARGETS
            )));
        }
        Ok(())
    }

    fn build_request_payload(&self) -> Result<Vec<u8>> {
        if self.targets.len() > MAX_TARGETS {
            return Err(GatewayError::Encoding(format!(
                "{} targets exceed the {} fixed slots",
                self.targets.len(),
                MAX_TARGETS
            )));
        }
        let mut payload = vec![0u8; 6 + MAX_TARGETS * 3];
        payload[0..2].copy_from_slice(&self.session.to_be_bytes());
        payload[2] = self.originator;
        payload[3] = self.priority;
        payload[4] = self.parameter;
        payload[5] = self.targets.len() as u8;
        for (slot, (node, position)) in self.targets.iter().enumerate() {
            let at = 6 + slot * 3;
            payload[at] = *node;
            payload[at + 1..at + 3].copy_from_slice(&position.to_be_bytes());
        }
        Ok(payload)
    }

    fn extract_session_key(&self, code: CommandCode, payload: &[u8]) -> Option<SessionId> {
        // Every response in this exchange leads with the session id.
        if self.spec().accepts(code) {
            read_u16_be(payload, 0)
        } else {
            None
        }
    }

    fn handle_response(&mut self, code: CommandCode, payload: &[u8]) {
        match code {
            codes::GW_COMMAND_SEND_CFM => match read_u8(payload, 2) {
                Some(0) => self.accepted = true,
                Some(_) => self.state.fail("gateway rejected actuator command"),
                None => self.state.fail("truncated actuator command confirmation"),
            },
            codes::GW_COMMAND_RUN_STATUS_NTF => {
                if let (Some(node), Some(parameter), Some(value), Some(run_status), Some(reply)) = (
                    read_u8(payload, 2),
                    read_u8(payload, 3),
                    read_u16_be(payload, 4),
                    read_u8(payload, 6),
                    read_u8(payload, 7),
                ) {
                    self.run_events.push(RunStatusEvent {
                        node,
                        parameter,
                        value,
                        run_status,
                        reply,
                    });
                }
            }
            codes::GW_COMMAND_REMAINING_TIME_NTF => {
                if let (Some(node), Some(parameter), Some(seconds)) = (
                    read_u8(payload, 2),
                    read_u8(payload, 3),
                    read_u16_be(payload, 4),
                ) {
                    self.remaining_times.push(RemainingTime {
                        node,
                        parameter,
                        seconds,
                    });
                }
            }
            codes::GW_SESSION_FINISHED_NTF => self.state.complete(),
            other => self.state.protocol_mismatch(other),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
