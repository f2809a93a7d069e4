//! Enumerate the gateway's stored scenes.
//!
//! Exchange: one confirmation whose first payload byte declares how
//! many scenes exist. Zero scenes completes the command on the
//! confirmation alone. Otherwise a notification packs fixed-width
//! scene records back-to-back: each record is 65 bytes (id:1 +
//! name:64), the count of records in byte 0, records starting at
//! offset 1.

use std::any::Any;

use crate::error::Result;
use crate::protocol::CommandCode;

use super::{codes, parse_padded_name, read_u8, CommandSpec, CommandState, GatewayCommand};

/// Fixed stride of a packed scene record: id byte plus 64-byte name.
pub(crate) const SCENE_RECORD_LEN: usize = 65;

static SPEC: CommandSpec = CommandSpec {
    name: "get-scenes",
    request_code: codes::GW_GET_SCENE_LIST_REQ,
    response_codes: &[codes::GW_GET_SCENE_LIST_CFM, codes::GW_GET_SCENE_LIST_NTF],
    requires_session: false,
    node_specific: false,
};

/// A stored scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub id: u8,
    pub name: String,
}

/// Enumerate all stored scenes.
#[derive(Debug, Default)]
pub struct GetScenes {
    expected_count: Option<u8>,
    scenes: Vec<Scene>,
    state: CommandState,
}

impl GetScenes {
    pub fn new() -> Self {
        Self {
            expected_count: None,
            scenes: Vec::new(),
            state: CommandState::new(),
        }
    }

    /// Scene count the confirmation announced, once received.
    pub fn expected_count(&self) -> Option<u8> {
        self.expected_count
    }

    /// Scenes accumulated so far, in record order.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Consume the command and take the accumulated scenes.
    pub fn into_scenes(self) -> Vec<Scene> {
        self.scenes
    }

    fn consume_records(&mut self, payload: &[u8]) {
        let Some(count) = read_u8(payload, 0) else {
            self.state.fail("truncated scene list notification");
            return;
        };
        for i in 0..count as usize {
            let start = 1 + i * SCENE_RECORD_LEN;
            let Some(record) = payload.get(start..start + SCENE_RECORD_LEN) else {
                self.state.fail(format!(
                    "scene list notification declares {count} records but holds {i}"
                ));
                return;
            };
            self.scenes.push(Scene {
                id: record[0],
                name: parse_padded_name(&record[1..]),
            });
        }
        if self.scenes.len() >= usize::from(self.expected_count.unwrap_or(count)) {
            self.state.complete();
        }
    }
}

impl GatewayCommand for GetScenes {
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
            codes::GW_GET_SCENE_LIST_CFM => match read_u8(payload, 0) {
                Some(0) => self.state.complete(),
                Some(count) => self.expected_count = Some(count),
                None => self.state.fail("truncated scene list confirmation"),
            },
            codes::GW_GET_SCENE_LIST_NTF => self.consume_records(payload),
            other => self.state.protocol_mismatch(other),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
