//! Query a single node's registration data.
//!
//! Exchange: confirmation, then exactly one notification carrying the
//! node information. Correlation is by node identifier, and the offset
//! of that identifier differs per response code: the confirmation puts
//! a status byte first (node id at offset 1) while the notification
//! leads with the node id (offset 0). Each (kind, response code) pair
//! gets its own explicit mapping.

use std::any::Any;

use crate::error::Result;
use crate::protocol::CommandCode;

use super::{codes, read_u8, CommandSpec, CommandState, GatewayCommand, NodeId, NodeInfo};

static SPEC: CommandSpec = CommandSpec {
    name: "get-node",
    request_code: codes::GW_GET_NODE_INFORMATION_REQ,
    response_codes: &[
        codes::GW_GET_NODE_INFORMATION_CFM,
        codes::GW_GET_NODE_INFORMATION_NTF,
    ],
    requires_session: false,
    node_specific: true,
};

/// Fetch registration data for one node.
#[derive(Debug)]
pub struct GetNode {
    node: NodeId,
    info: Option<NodeInfo>,
    state: CommandState,
}

impl GetNode {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            info: None,
            state: CommandState::new(),
        }
    }

    /// The node information, once the notification has arrived.
    pub fn info(&self) -> Option<&NodeInfo> {
        self.info.as_ref()
    }

    /// Consume the command and take the node information.
    pub fn into_info(self) -> Option<NodeInfo> {
        self.info
    }
}

impl GatewayCommand for GetNode {
    fn spec(&self) -> &'static CommandSpec {
        &SPEC
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    fn node_id(&self) -> Option<NodeId> {
        Some(self.node)
    }

    fn build_request_payload(&self) -> Result<Vec<u8>> {
        Ok(vec![self.node])
    }

    fn extract_node_key(&self, code: CommandCode, payload: &[u8]) -> Option<NodeId> {
        match code {
            // Confirmation: status byte first, node id second.
            codes::GW_GET_NODE_INFORMATION_CFM => read_u8(payload, 1),
            // Notification: node id leads the payload.
            codes::GW_GET_NODE_INFORMATION_NTF => read_u8(payload, 0),
            _ => None,
        }
    }

    fn handle_response(&mut self, code: CommandCode, payload: &[u8]) {
        match code {
            codes::GW_GET_NODE_INFORMATION_CFM => match read_u8(payload, 0) {
                Some(0) => {}
                Some(_) => self.state.fail(format!(
                    "gateway rejected information request for node {}",
                    self.node
                )),
                None => self.state.fail("truncated node information confirmation"),
            },
            codes::GW_GET_NODE_INFORMATION_NTF => match NodeInfo::parse(payload) {
                Some(info) => {
                    self.info = Some(info);
                    self.state.complete();
                }
                None => self.state.fail("truncated node information notification"),
            },
            other => self.state.protocol_mismatch(other),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
