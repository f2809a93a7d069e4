//! End-to-end engine tests over a fake duplex transport.
//!
//! The "gateway" side of each test reads request frames off the wire
//! and answers with hand-built SLIP frames, exercising the full path:
//! SLIP deframing, structural validation, correlation, command state
//! machines and the run loop.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

use klf200_client::commands::codes;
use klf200_client::commands::{
    GatewayCommand, GetAllNodes, GetNode, GetScenes, Login, NodeInfo, SendCommand, SetUtcTime,
};
use klf200_client::protocol::{encode_frame, slip, Frame, FrameBuffer};
use klf200_client::{
    CommandProcessor, GatewayClient, GatewayConfig, GatewayError, ProcessorConfig,
    ProcessorHandle, SessionAllocator,
};

struct FakeGateway {
    stream: DuplexStream,
    buffer: FrameBuffer,
}

impl FakeGateway {
    fn new(stream: DuplexStream) -> Self {
        Self {
            stream,
            buffer: FrameBuffer::new(),
        }
    }

    /// Read the next request frame the engine transmitted.
    async fn next_request(&mut self) -> Frame {
        let mut buf = [0u8; 512];
        loop {
            let n = self.stream.read(&mut buf).await.expect("engine hung up");
            assert!(n > 0, "engine closed the stream");
            let mut frames = self.buffer.push(&buf[..n]);
            if let Some(frame) = frames.pop() {
                return frame;
            }
        }
    }

    /// Send a response frame to the engine.
    async fn send(&mut self, code: u16, payload: &[u8]) {
        let wire = slip::wrap(&encode_frame(code, payload).unwrap());
        self.stream.write_all(&wire).await.unwrap();
    }
}

/// Engine wired to a fake gateway, no login exchange.
fn spawn_engine(
    timeout: Duration,
) -> (ProcessorHandle, FakeGateway, Vec<tokio::task::JoinHandle<()>>) {
    let (gateway_side, client_side) = tokio::io::duplex(4096);
    let (read_half, write_half) = tokio::io::split(client_side);

    let (frames, reader_task) = spawn_reader(read_half);
    let (handle, engine_task) = CommandProcessor::spawn(
        write_half,
        frames,
        ProcessorConfig {
            command_timeout: timeout,
            ..ProcessorConfig::default()
        },
    );

    (
        handle,
        FakeGateway::new(gateway_side),
        vec![reader_task, engine_task],
    )
}

fn spawn_reader(
    read_half: ReadHalf<DuplexStream>,
) -> (
    tokio::sync::mpsc::Receiver<Frame>,
    tokio::task::JoinHandle<()>,
) {
    klf200_client::transport::spawn_frame_reader(read_half, 32)
}

fn sample_node(id: u8, name: &str) -> NodeInfo {
    NodeInfo {
        id,
        order: 1,
        placement: 0,
        name: name.to_string(),
        velocity: 0,
        node_type: 0x0040,
        current_position: 0xC000,
        target_position: 0xC000,
    }
}

/// One 65-byte scene record: id + zero-padded name.
fn scene_record(id: u8, name: &str) -> Vec<u8> {
    let mut record = vec![0u8; 65];
    record[0] = id;
    record[1..1 + name.len()].copy_from_slice(name.as_bytes());
    record
}

#[tokio::test]
async fn get_all_nodes_accumulates_two_nodes_in_order() {
    let (handle, mut gateway, _tasks) = spawn_engine(Duration::from_secs(2));

    let pending = handle.submit(GetAllNodes::new()).unwrap();

    let request = gateway.next_request().await;
    assert_eq!(request.command_code(), codes::GW_GET_ALL_NODES_INFORMATION_REQ);
    assert!(request.payload().is_empty());

    gateway
        .send(codes::GW_GET_ALL_NODES_INFORMATION_CFM, &[0x00, 0x02])
        .await;
    gateway
        .send(
            codes::GW_GET_ALL_NODES_INFORMATION_NTF,
            &sample_node(3, "Kitchen").to_payload(),
        )
        .await;
    gateway
        .send(
            codes::GW_GET_ALL_NODES_INFORMATION_NTF,
            &sample_node(9, "Attic").to_payload(),
        )
        .await;
    gateway
        .send(codes::GW_GET_ALL_NODES_INFORMATION_FINISHED_NTF, &[])
        .await;

    let cmd = pending.finished().await.unwrap();
    assert_eq!(cmd.state().error_detail(), None);
    let nodes = cmd.into_nodes();
    assert_eq!(nodes.len(), 2);
    assert_eq!((nodes[0].id, nodes[0].name.as_str()), (3, "Kitchen"));
    assert_eq!((nodes[1].id, nodes[1].name.as_str()), (9, "Attic"));
}

#[tokio::test]
async fn rejected_enumeration_discards_later_frames_without_crashing() {
    let (handle, mut gateway, _tasks) = spawn_engine(Duration::from_secs(2));

    let pending = handle.submit(GetAllNodes::new()).unwrap();
    let _request = gateway.next_request().await;

    // Reject, then keep talking anyway.
    gateway
        .send(codes::GW_GET_ALL_NODES_INFORMATION_CFM, &[0x01, 0x00])
        .await;
    gateway
        .send(
            codes::GW_GET_ALL_NODES_INFORMATION_NTF,
            &sample_node(3, "Kitchen").to_payload(),
        )
        .await;
    gateway
        .send(codes::GW_GET_ALL_NODES_INFORMATION_FINISHED_NTF, &[])
        .await;

    let cmd = pending.finished().await.unwrap();
    assert!(cmd.state().error_detail().is_some());
    assert!(cmd.nodes().is_empty());

    // The engine is still alive and serves the next command.
    let pending = handle.submit(SetUtcTime::new(1_700_000_000)).unwrap();
    let request = gateway.next_request().await;
    assert_eq!(request.command_code(), codes::GW_SET_UTC_REQ);
    gateway.send(codes::GW_SET_UTC_CFM, &[]).await;
    let cmd = pending.finished().await.unwrap();
    assert_eq!(cmd.state().error_detail(), None);
}

#[tokio::test]
async fn overlong_password_never_reaches_the_wire() {
    let (handle, mut gateway, _tasks) = spawn_engine(Duration::from_secs(2));

    let result = handle.submit(Login::new("p".repeat(40)));
    assert!(matches!(result, Err(GatewayError::Validation(_))));

    // The next submission produces the first frame on the wire.
    let _pending = handle.submit(SetUtcTime::new(1_700_000_000)).unwrap();
    let request = gateway.next_request().await;
    assert_eq!(request.command_code(), codes::GW_SET_UTC_REQ);
}

#[tokio::test]
async fn get_node_correlates_on_per_code_offsets() {
    let (handle, mut gateway, _tasks) = spawn_engine(Duration::from_secs(2));

    let pending = handle.submit(GetNode::new(7)).unwrap();

    let request = gateway.next_request().await;
    assert_eq!(request.command_code(), codes::GW_GET_NODE_INFORMATION_REQ);
    assert_eq!(request.payload(), &[7]);

    // Confirmation for an unrelated node is not consumed.
    gateway
        .send(codes::GW_GET_NODE_INFORMATION_CFM, &[0x00, 0x08])
        .await;
    gateway
        .send(codes::GW_GET_NODE_INFORMATION_CFM, &[0x00, 0x07])
        .await;
    gateway
        .send(
            codes::GW_GET_NODE_INFORMATION_NTF,
            &sample_node(7, "Skylight").to_payload(),
        )
        .await;

    let cmd = pending.finished().await.unwrap();
    assert_eq!(cmd.state().error_detail(), None);
    assert_eq!(cmd.info().unwrap().name, "Skylight");
}

#[tokio::test]
async fn scene_list_with_zero_scenes_completes_on_confirmation() {
    let (handle, mut gateway, _tasks) = spawn_engine(Duration::from_secs(2));

    let pending = handle.submit(GetScenes::new()).unwrap();
    let _request = gateway.next_request().await;

    gateway.send(codes::GW_GET_SCENE_LIST_CFM, &[0x00]).await;

    let cmd = pending.finished().await.unwrap();
    assert_eq!(cmd.state().error_detail(), None);
    assert!(cmd.scenes().is_empty());
}

#[tokio::test]
async fn scene_list_parses_packed_records() {
    let (handle, mut gateway, _tasks) = spawn_engine(Duration::from_secs(2));

    let pending = handle.submit(GetScenes::new()).unwrap();
    let _request = gateway.next_request().await;

    gateway.send(codes::GW_GET_SCENE_LIST_CFM, &[0x02]).await;
    let mut payload = vec![0x02];
    payload.extend(scene_record(0, "Morning"));
    payload.extend(scene_record(4, "Ventilate"));
    gateway.send(codes::GW_GET_SCENE_LIST_NTF, &payload).await;

    let cmd = pending.finished().await.unwrap();
    let scenes = cmd.into_scenes();
    assert_eq!(scenes.len(), 2);
    assert_eq!((scenes[0].id, scenes[0].name.as_str()), (0, "Morning"));
    assert_eq!((scenes[1].id, scenes[1].name.as_str()), (4, "Ventilate"));
}

#[tokio::test]
async fn actuator_command_runs_through_its_session() {
    let (handle, mut gateway, _tasks) = spawn_engine(Duration::from_secs(2));

    let sessions = SessionAllocator::with_seed(0x0200);
    let pending = handle
        .submit(SendCommand::new(&sessions, vec![(7, 0xC800)]))
        .unwrap();

    let request = gateway.next_request().await;
    assert_eq!(request.command_code(), codes::GW_COMMAND_SEND_REQ);
    let session = [request.payload()[0], request.payload()[1]];
    assert_eq!(session, [0x02, 0x00]);

    // Another session's traffic interleaves; ours must ignore it.
    gateway
        .send(codes::GW_SESSION_FINISHED_NTF, &[0x02, 0x01])
        .await;

    let mut cfm = session.to_vec();
    cfm.push(0x00);
    gateway.send(codes::GW_COMMAND_SEND_CFM, &cfm).await;

    let mut run_status = session.to_vec();
    run_status.extend_from_slice(&[0x07, 0x00, 0xC8, 0x00, 0x02, 0x01]);
    gateway.send(codes::GW_COMMAND_RUN_STATUS_NTF, &run_status).await;

    gateway.send(codes::GW_SESSION_FINISHED_NTF, &session).await;

    let cmd = pending.finished().await.unwrap();
    assert_eq!(cmd.state().error_detail(), None);
    assert!(cmd.accepted());
    assert_eq!(cmd.run_events().len(), 1);
    assert_eq!(cmd.run_events()[0].node, 7);
}

#[tokio::test(start_paused = true)]
async fn silent_gateway_cannot_hang_the_engine() {
    let (handle, mut gateway, _tasks) = spawn_engine(Duration::from_millis(250));

    let pending = handle.submit(GetNode::new(1)).unwrap();
    let _request = gateway.next_request().await;

    // No response at all: the command must still terminate.
    let cmd = pending.finished().await.unwrap();
    assert_eq!(
        cmd.state().error_detail(),
        Some("timed out awaiting terminal response")
    );

    // And the queue keeps moving afterwards.
    let pending = handle.submit(SetUtcTime::new(1_700_000_000)).unwrap();
    let request = gateway.next_request().await;
    assert_eq!(request.command_code(), codes::GW_SET_UTC_REQ);
    gateway.send(codes::GW_SET_UTC_CFM, &[]).await;
    let cmd = pending.finished().await.unwrap();
    assert_eq!(cmd.state().error_detail(), None);
}

#[tokio::test]
async fn client_logs_in_and_controls_an_actuator() {
    let (gateway_side, client_side) = tokio::io::duplex(4096);
    let (read_half, write_half): (ReadHalf<DuplexStream>, WriteHalf<DuplexStream>) =
        tokio::io::split(client_side);

    let mut gateway = FakeGateway::new(gateway_side);
    let gateway_task = tokio::spawn(async move {
        let request = gateway.next_request().await;
        assert_eq!(request.command_code(), codes::GW_PASSWORD_ENTER_REQ);
        assert_eq!(&request.payload()[..8], b"velux123");
        assert_eq!(request.payload().len(), 32);
        gateway.send(codes::GW_PASSWORD_ENTER_CFM, &[0x00]).await;

        let request = gateway.next_request().await;
        assert_eq!(request.command_code(), codes::GW_COMMAND_SEND_REQ);
        let session = [request.payload()[0], request.payload()[1]];
        let mut cfm = session.to_vec();
        cfm.push(0x00);
        gateway.send(codes::GW_COMMAND_SEND_CFM, &cfm).await;
        gateway.send(codes::GW_SESSION_FINISHED_NTF, &session).await;
    });

    let mut config = GatewayConfig::for_host("test");
    config.password = "velux123".into();
    config.command_timeout_ms = 2_000;

    let client = GatewayClient::start(read_half, write_half, &config)
        .await
        .unwrap();

    let sessions = SessionAllocator::new();
    let cmd = client
        .submit(SendCommand::new(&sessions, vec![(7, 0x0000)]))
        .unwrap()
        .finished()
        .await
        .unwrap();
    assert_eq!(cmd.state().error_detail(), None);

    gateway_task.await.unwrap();
    client.shutdown().await;
}
