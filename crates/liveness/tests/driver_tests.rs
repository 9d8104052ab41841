use image::Image;
use liveness::{
    Command, EventQueue, FramePayload, LivenessConfig, ResultPersister, ServerMessage,
    SessionDriver, SessionMachine, SessionState, SideMessage, StreamCapture,
};
use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinHandle, time::timeout};

const SKIN: [u8; 3] = [200, 140, 110];

fn skin_payload() -> FramePayload {
    let image = Image::from_fn(32, 32, |_, _| SKIN);
    FramePayload::Encoded(image::encode_png(&image).expect("encode failed"))
}

fn quick_config() -> LivenessConfig {
    LivenessConfig::default()
        .with_hysteresis(1)
        .with_min_frames(3)
}

struct Harness {
    queue: Arc<EventQueue>,
    rx: mpsc::Receiver<ServerMessage>,
    handle: JoinHandle<liveness::SessionStats>,
}

fn start(config: LivenessConfig, output_dir: &std::path::Path) -> Harness {
    let machine = SessionMachine::new(
        "driver-session",
        Arc::new(config.clone()),
        Box::new(StreamCapture::new()),
    )
    .expect("machine creation failed");
    let queue = Arc::new(EventQueue::new(config.session.queue_capacity));
    let (tx, rx) = mpsc::channel(64);
    let persister = Arc::new(ResultPersister::new(output_dir));
    let driver = SessionDriver::new(machine, queue.clone(), tx, persister);
    Harness {
        queue,
        rx,
        handle: tokio::spawn(driver.run()),
    }
}

fn scratch_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("liveness-driver-{}-{}", std::process::id(), name))
}

async fn next(rx: &mut mpsc::Receiver<ServerMessage>) -> ServerMessage {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no message within 5s")
        .expect("driver hung up")
}

fn status_text(message: ServerMessage) -> String {
    match message {
        ServerMessage::Side(SideMessage::Status { message }) => message,
        other => panic!("expected a status message, got {other:?}"),
    }
}

fn error_code(message: ServerMessage) -> &'static str {
    match message {
        ServerMessage::Side(SideMessage::Error { code, .. }) => code,
        other => panic!("expected an error message, got {other:?}"),
    }
}

#[tokio::test]
async fn test_greeting_then_commands_in_order() {
    let mut h = start(quick_config(), &scratch_dir("order"));

    match next(&mut h.rx).await {
        ServerMessage::Side(SideMessage::Connection {
            session_id,
            status,
            commands,
            ..
        }) => {
            assert_eq!(session_id, "driver-session");
            assert_eq!(status, "ready");
            assert_eq!(commands.len(), 5);
        }
        other => panic!("expected a greeting, got {other:?}"),
    }

    h.queue.push_command(Ok(Command::StartAnalysis));
    h.queue.push_command(Ok(Command::StopStream));
    h.queue.push_command(Command::parse("{oops"));
    h.queue.push_command(Ok(Command::ResumeStream));
    h.queue.push_command(Ok(Command::SaveResult));

    assert_eq!(status_text(next(&mut h.rx).await), "Analysis started");
    assert_eq!(status_text(next(&mut h.rx).await), "Streaming paused");
    assert_eq!(error_code(next(&mut h.rx).await), "invalid_command");
    assert_eq!(status_text(next(&mut h.rx).await), "Streaming resumed");
    assert_eq!(error_code(next(&mut h.rx).await), "invalid_state");

    h.queue.close();
    h.handle.await.expect("driver panicked");
}

#[tokio::test]
async fn test_frames_produce_packets_until_decision() {
    let mut h = start(
        quick_config().with_auto_reset(Duration::from_secs(60)),
        &scratch_dir("packets"),
    );
    next(&mut h.rx).await;

    h.queue.push_command(Ok(Command::StartAnalysis));
    assert_eq!(status_text(next(&mut h.rx).await), "Analysis started");

    let mut states = Vec::new();
    for _ in 0..3 {
        h.queue.push_frame(skin_payload(), 1);
        match next(&mut h.rx).await {
            ServerMessage::Packet(packet) => states.push((packet.status, packet.frames_analyzed)),
            other => panic!("expected a packet, got {other:?}"),
        }
    }
    assert_eq!(
        states,
        vec![
            (SessionState::Analyzing, 1),
            (SessionState::Analyzing, 2),
            (SessionState::Spoof, 3),
        ]
    );

    h.queue.close();
    let stats = h.handle.await.expect("driver panicked");
    assert_eq!(stats.frames_received, 3);
    assert_eq!(stats.frames_dropped, 0);
}

#[tokio::test]
async fn test_dropped_and_undecodable_frames_are_silent() {
    let mut h = start(quick_config(), &scratch_dir("silent"));
    next(&mut h.rx).await;

    // not started yet
    h.queue.push_frame(skin_payload(), 1);
    h.queue.push_command(Ok(Command::StartAnalysis));
    h.queue.push_frame(FramePayload::Encoded(b"junk".to_vec()), 2);
    h.queue.push_command(Ok(Command::Reset));

    assert_eq!(status_text(next(&mut h.rx).await), "Analysis started");
    assert_eq!(status_text(next(&mut h.rx).await), "Analysis reset");

    h.queue.close();
    let stats = h.handle.await.expect("driver panicked");
    assert_eq!(stats.frames_received, 2);
    assert_eq!(stats.frames_dropped, 1);
    assert_eq!(stats.decode_errors, 1);
}

#[tokio::test(start_paused = true)]
async fn test_auto_reset_after_decision() {
    let mut h = start(quick_config(), &scratch_dir("auto"));
    h.rx.recv().await.expect("greeting");

    h.queue.push_command(Ok(Command::StartAnalysis));
    h.rx.recv().await.expect("start reply");
    for _ in 0..3 {
        h.queue.push_frame(skin_payload(), 1);
        h.rx.recv().await.expect("packet");
    }
    let decided_at = tokio::time::Instant::now();

    let message = h.rx.recv().await.expect("driver hung up");
    assert_eq!(status_text(message), "Ready for next analysis");
    let elapsed = decided_at.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "reset after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3100), "reset after {elapsed:?}");

    // back in WAITING: the next frame starts a fresh analysis
    h.queue.push_frame(skin_payload(), 2);
    match h.rx.recv().await.expect("packet") {
        ServerMessage::Packet(packet) => {
            assert_eq!(packet.status, SessionState::Analyzing);
            assert_eq!(packet.frames_analyzed, 1);
        }
        other => panic!("expected a packet, got {other:?}"),
    }

    h.queue.close();
    h.handle.await.expect("driver panicked");
}

#[tokio::test(start_paused = true)]
async fn test_manual_reset_cancels_auto_reset() {
    let mut h = start(quick_config(), &scratch_dir("cancel"));
    h.rx.recv().await.expect("greeting");

    h.queue.push_command(Ok(Command::StartAnalysis));
    h.rx.recv().await.expect("start reply");
    for _ in 0..3 {
        h.queue.push_frame(skin_payload(), 1);
        h.rx.recv().await.expect("packet");
    }

    h.queue.push_command(Ok(Command::Reset));
    assert_eq!(
        status_text(h.rx.recv().await.expect("reset reply")),
        "Analysis reset"
    );

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(h.rx.try_recv().is_err());

    h.queue.close();
    h.handle.await.expect("driver panicked");
}

#[tokio::test]
async fn test_save_result_writes_files() {
    let dir = scratch_dir("save");
    let _ = std::fs::remove_dir_all(&dir);
    let mut h = start(
        quick_config()
            .with_threshold(0.0)
            .with_auto_reset(Duration::from_secs(60)),
        &dir,
    );
    next(&mut h.rx).await;

    h.queue.push_command(Ok(Command::StartAnalysis));
    next(&mut h.rx).await;
    for _ in 0..3 {
        h.queue.push_frame(skin_payload(), 1);
        next(&mut h.rx).await;
    }

    h.queue.push_command(Ok(Command::SaveResult));
    match next(&mut h.rx).await {
        ServerMessage::Side(SideMessage::SaveResult {
            filename,
            metadata_file,
            save_count,
            ..
        }) => {
            assert_eq!(save_count, 1);
            assert!(filename.ends_with(".png"));
            assert!(metadata_file.ends_with(".json"));
            assert!(std::path::Path::new(&filename).exists());
            let metadata = std::fs::read_to_string(&metadata_file).expect("metadata missing");
            assert!(metadata.contains("\"decision\": \"LIVE\""));
        }
        other => panic!("expected a save result, got {other:?}"),
    }

    h.queue.close();
    let stats = h.handle.await.expect("driver panicked");
    assert_eq!(stats.saves, 1);
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_driver_stops_when_client_is_gone() {
    let h = start(quick_config(), &scratch_dir("gone"));
    drop(h.rx);
    h.queue.push_command(Ok(Command::StartAnalysis));

    timeout(Duration::from_secs(5), h.handle)
        .await
        .expect("driver did not stop")
        .expect("driver panicked");
}

#[tokio::test]
async fn test_command_burst_keeps_order() {
    let mut h = start(quick_config(), &scratch_dir("burst"));
    next(&mut h.rx).await;

    h.queue.push_command(Ok(Command::StartAnalysis));
    for i in 0..40 {
        let command = if i % 2 == 0 {
            Command::StopStream
        } else {
            Command::ResumeStream
        };
        h.queue.push_command(Ok(command));
        if i % 10 == 0 {
            h.queue.push_frame(skin_payload(), i);
        }
    }
    h.queue.push_command(Ok(Command::StopStream));

    assert_eq!(status_text(next(&mut h.rx).await), "Analysis started");
    for i in 0..40 {
        let expected = if i % 2 == 0 {
            "Streaming paused"
        } else {
            "Streaming resumed"
        };
        assert_eq!(status_text(next(&mut h.rx).await), expected);
    }
    assert_eq!(status_text(next(&mut h.rx).await), "Streaming paused");

    assert!(!h.handle.is_finished());
    h.queue.close();
    let stats = h.handle.await.expect("driver panicked");
    // every frame arrived right after a STOP and was dropped
    assert_eq!(stats.frames_dropped, 4);
}
