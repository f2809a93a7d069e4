//! Set the gateway's clock.
//!
//! Request payload is a 64-bit big-endian epoch-seconds value; a single
//! confirmation completes the exchange.

use std::any::Any;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::protocol::CommandCode;

use super::{codes, CommandSpec, CommandState, GatewayCommand};

static SPEC: CommandSpec = CommandSpec {
    name: "set-utc-time",
    request_code: codes::GW_SET_UTC_REQ,
    response_codes: &[codes::GW_SET_UTC_CFM],
    requires_session: false,
    node_specific: false,
};

/// Set the gateway clock to a UTC timestamp.
#[derive(Debug)]
pub struct SetUtcTime {
    epoch_seconds: u64,
    state: CommandState,
}

impl SetUtcTime {
    pub fn new(epoch_seconds: u64) -> Self {
        Self {
            epoch_seconds,
            state: CommandState::new(),
        }
    }

    /// Set the gateway clock to the host's current time.
    pub fn now() -> Self {
        let epoch_seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::new(epoch_seconds)
    }

    pub fn epoch_seconds(&self) -> u64 {
        self.epoch_seconds
    }
}

impl GatewayCommand for SetUtcTime {
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
        Ok(self.epoch_seconds.to_be_bytes().to_vec())
    }

    fn handle_response(&mut self, code: CommandCode, _payload: &[u8]) {
        match code {
            codes::GW_SET_UTC_CFM => self.state.complete(),
            other => self.state.protocol_mismatch(other),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandStatus;

    #[test]
    fn payload_is_big_endian_epoch_seconds() {
        let cmd = SetUtcTime::new(0x0000_0001_0203_0405);
        assert_eq!(
            cmd.build_request_payload().unwrap(),
            vec![0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05]
        );
    }

    #[test]
    fn confirmation_completes() {
        let mut cmd = SetUtcTime::new(1_700_000_000);
        cmd.state_mut().mark_processing();
        cmd.handle_response(codes::GW_SET_UTC_CFM, &[]);
        assert_eq!(*cmd.state().status(), CommandStatus::Complete);
    }

    #[test]
    fn now_is_past_2023() {
        assert!(SetUtcTime::now().epoch_seconds() > 1_672_531_200);
    }
}
