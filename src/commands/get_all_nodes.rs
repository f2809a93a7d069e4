//! Enumerate every node the gateway knows about.
//!
//! Exchange: one confirmation (accept/reject, plus the expected node
//! count), then one notification per node, then a finished
//! notification. A rejected confirmation terminates the command
//! immediately; later notifications are discarded by the engine as
//! unmatched.
//!
//! Node information notification layout (offsets into the payload):
//!
//! ```text
//! 0       node id
//! 1..3    order (u16 BE)
//! 3       placement
//! 4..68   name (64 bytes, zero-padded UTF-8)
//! 68      velocity
//! 69..71  node type/subtype (u16 BE)
//! 71..73  current position (u16 BE)
//! 73..75  target position (u16 BE)
//! ```

use std::any::Any;

use crate::error::Result;
use crate::protocol::CommandCode;

use super::{
    codes, parse_padded_name, read_u16_be, read_u8, CommandSpec, CommandState, GatewayCommand,
    NodeId,
};

/// Byte width of the name field in node notifications.
const NAME_FIELD_LEN: usize = 64;

/// Minimum payload length of a node information notification.
const NODE_NTF_MIN_LEN: usize = 75;

static SPEC: CommandSpec = CommandSpec {
    name: "get-all-nodes",
    request_code: codes::GW_GET_ALL_NODES_INFORMATION_REQ,
    response_codes: &[
        codes::GW_GET_ALL_NODES_INFORMATION_CFM,
        codes::GW_GET_ALL_NODES_INFORMATION_NTF,
        codes::GW_GET_ALL_NODES_INFORMATION_FINISHED_NTF,
    ],
    requires_session: false,
    node_specific: false,
};

/// A node's registration data as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub order: u16,
    pub placement: u8,
    pub name: String,
    pub velocity: u8,
    pub node_type: u16,
    pub current_position: u16,
    pub target_position: u16,
}

impl NodeInfo {
    /// Parse a node information payload. `None` when truncated.
    pub(crate) fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < NODE_NTF_MIN_LEN {
            return None;
        }
        Some(Self {
            id: read_u8(payload, 0)?,
            order: read_u16_be(payload, 1)?,
            placement: read_u8(payload, 3)?,
            name: parse_padded_name(&payload[4..4 + NAME_FIELD_LEN]),
            velocity: read_u8(payload, 68)?,
            node_type: read_u16_be(payload, 69)?,
            current_position: read_u16_be(payload, 71)?,
            target_position: read_u16_be(payload, 73)?,
        })
    }

    /// Serialize into notification layout. Useful for gateway simulators
    /// and tests; names longer than the field are truncated.
    pub fn to_payload(&self) -> Vec<u8> {
        let mut payload = vec![0u8; NODE_NTF_MIN_LEN];
        payload[0] = self.id;
        payload[1..3].copy_from_slice(&self.order.to_be_bytes());
        payload[3] = self.placement;
        let name = self.name.as_bytes();
        payload[4..4 + name.len().min(NAME_FIELD_LEN)]
            .copy_from_slice(&name[..name.len().min(NAME_FIELD_LEN)]);
        payload[68] = self.velocity;
        payload[69..71].copy_from_slice(&self.node_type.to_be_bytes());
        payload[71..73].copy_from_slice(&self.current_position.to_be_bytes());
        payload[73..75].copy_from_slice(&self.target_position.to_be_bytes());
        payload
    }
}

/// Enumerate all registered nodes.
#[derive(Debug, Default)]
pub struct GetAllNodes {
    expected_count: Option<u8>,
    nodes: Vec<NodeInfo>,
    state: CommandState,
}

impl GetAllNodes {
    pub fn new() -> Self {
        Self {
            expected_count: None,
            nodes: Vec::new(),
            state: CommandState::new(),
        }
    }

    /// Node count the confirmation announced, once received.
    pub fn expected_count(&self) -> Option<u8> {
        self.expected_count
    }

    /// Nodes accumulated so far, in arrival order.
    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    /// Consume the command and take the accumulated nodes.
    pub fn into_nodes(self) -> Vec<NodeInfo> {
        self.nodes
    }
}

impl GatewayCommand for GetAllNodes {
    fn spec(&self) -> &'static CommandSpec {
        &SPEC
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    fn build_request_payload(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn handle_response(&mut self, code: CommandCode, payload: &[u8]) {
        match code {
            codes::GW_GET_ALL_NODES_INFORMATION_CFM => match read_u8(payload, 0) {
                Some(0) => self.expected_count = read_u8(payload, 1),
                Some(_) => self.state.fail("gateway rejected node enumeration"),
                None => self.state.fail("truncated node enumeration confirmation"),
            },
            codes::GW_GET_ALL_NODES_INFORMATION_NTF => match NodeInfo::parse(payload) {
                Some(node) => self.nodes.push(node),
                None => self.state.fail("truncated node information notification"),
            },
            codes::GW_GET_ALL_NODES_INFORMATION_FINISHED_NTF => self.state.complete(),
            other => self.state.protocol_mismatch(other),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
