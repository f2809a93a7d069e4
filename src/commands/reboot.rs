//! Reboot the gateway.
//!
//! Empty request, single confirmation. The gateway drops the
//! connection shortly after confirming, so callers should expect the
//! engine to report a closed connection for anything submitted after
//! this.

use std::any::Any;

use crate::error::Result;
use crate::protocol::CommandCode;

use super::{codes, CommandSpec, CommandState, GatewayCommand};

static SPEC: CommandSpec = CommandSpec {
    name: "reboot",
    request_code: codes::GW_REBOOT_REQ,
    response_codes: &[codes::GW_REBOOT_CFM],
    requires_session: false,
    node_specific: false,
};

/// Request a gateway reboot.
#[derive(Debug, Default)]
pub struct Reboot {
    state: CommandState,
}

impl Reboot {
    pub fn new() -> Self {
        Self {
            state: CommandState::new(),
        }
    }
}

impl GatewayCommand for Reboot {
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

    fn handle_response(&mut self, code: CommandCode, _payload: &[u8]) {
        match code {
            codes::GW_REBOOT_CFM => self.state.complete(),
            other => self.state.protocol_mismatch(other),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
