//! Password-enter exchange.
//!
//! The gateway refuses every other request until a password has been
//! accepted, so this is always the first command on a fresh connection.
//! Single confirmation: payload byte 0 is 0 on acceptance, non-zero on
//! rejection.

use std::any::Any;

use crate::error::{GatewayError, Result};
use crate::protocol::CommandCode;

use super::{codes, read_u8, CommandSpec, CommandState, GatewayCommand};

/// Maximum password length the gateway accepts, in bytes.
pub const MAX_PASSWORD_LEN: usize = 32;

static SPEC: CommandSpec = CommandSpec {
    name: "login",
    request_code: codes::GW_PASSWORD_ENTER_REQ,
    response_codes: &[codes::GW_PASSWORD_ENTER_CFM],
    requires_session: false,
    node_specific: false,
};

/// Authenticate the connection with the gateway password.
#[derive(Debug)]
pub struct Login {
    password: String,
    state: CommandState,
}

impl Login {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            state: CommandState::new(),
        }
    }
}

impl GatewayCommand for Login {
    fn spec(&self) -> &'static CommandSpec {
        &SPEC
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    fn validate(&self) -> Result<()> {
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err(GatewayError::Validation(format!(
                "password is {} bytes, maximum is {}",
                self.password.len(),
                MAX_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    fn build_request_payload(&self) -> Result<Vec<u8>> {
        // Fixed-width field, zero padded.
        let mut payload = vec![0u8; MAX_PASSWORD_LEN];
        payload[..self.password.len()].copy_from_slice(self.password.as_bytes());
        Ok(payload)
    }

    fn handle_response(&mut self, code: CommandCode, payload: &[u8]) {
        match code {
            codes::GW_PASSWORD_ENTER_CFM => match read_u8(payload, 0) {
                Some(0) => self.state.complete(),
                Some(_) => self.state.fail("password rejected by gateway"),
                None => self.state.fail("truncated password confirmation"),
            },
            other => self.state.protocol_mismatch(other),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
