use liveness::{
    AttackType, ConfidenceBand, Decision, DetectionResult, FrameMeta, LivenessError,
    QualityChange, ServerMessage, SessionState, SignalScores, StreamPublisher, TickReport,
    publisher::{self, INSTRUCTION_COLLECTING, INSTRUCTION_WAITING},
};

fn report(state: SessionState, frames_analyzed: u32, motion: f64) -> TickReport {
    TickReport {
        frame: FrameMeta {
            seq: 9,
            captured_at: 1234,
            width: 640,
            height: 480,
        },
        state,
        finger_detected: state != SessionState::Waiting,
        scores: SignalScores {
            motion,
            ..SignalScores::uniform(0.5)
        },
        overall: 0.456789,
        frames_analyzed,
        frame_count: 12,
        progress: frames_analyzed as f64 / 15.0 * 100.0,
        result: None,
        decided: false,
    }
}

fn decided(decision: Decision, attack_type: Option<AttackType>) -> TickReport {
    let mut report = report(decision.state(), 15, 0.5);
    report.progress = 100.0;
    report.decided = true;
    report.result = Some(DetectionResult {
        session_id: "s".to_string(),
        timestamp: "2024-05-01T12:00:00.000Z".to_string(),
        overall: 0.876543,
        scores: SignalScores::uniform(0.876543),
        decision,
        attack_type,
        frames_analyzed: 15,
        confidence: 0.876543,
        confidence_band: ConfidenceBand::High,
        vetoed: false,
    });
    report
}

#[test]
fn test_percent_rounds_to_two_decimals() {
    assert_eq!(publisher::percent(0.456789), 45.68);
    assert_eq!(publisher::percent(1.0), 100.0);
    assert_eq!(publisher::percent(0.0), 0.0);
}

#[test]
fn test_instructions_follow_state() {
    assert_eq!(
        publisher::instruction(&report(SessionState::Waiting, 0, 0.0)),
        INSTRUCTION_WAITING
    );
    assert_eq!(
        publisher::instruction(&report(SessionState::Analyzing, 2, 0.0)),
        INSTRUCTION_COLLECTING
    );
    assert_eq!(
        publisher::instruction(&report(SessionState::Analyzing, 5, 0.05)),
        publisher::INSTRUCTION_LOW_MOTION
    );
    assert_eq!(
        publisher::instruction(&report(SessionState::Analyzing, 5, 0.8)),
        publisher::INSTRUCTION_GOOD_MOTION
    );
    assert_eq!(
        publisher::instruction(&report(SessionState::Analyzing, 5, 0.3)),
        "Analyzing liveness... 45%"
    );
    assert_eq!(
        publisher::instruction(&decided(Decision::Live, None)),
        publisher::INSTRUCTION_LIVE
    );
}

#[test]
fn test_spoof_instruction_names_attack() {
    let report = decided(Decision::Spoof, Some(AttackType::ScreenAttack));
    assert_eq!(
        publisher::instruction(&report),
        "Screen detected - Use real finger"
    );
    assert_eq!(
        publisher::spoof_instruction(Some(AttackType::Unknown)),
        publisher::INSTRUCTION_SPOOF
    );
}

#[test]
fn test_packet_while_analyzing() {
    let packet = StreamPublisher::new().packet(&report(SessionState::Analyzing, 4, 0.3));
    assert_eq!(packet.status, SessionState::Analyzing);
    assert_eq!(packet.result, None);
    assert_eq!(packet.attack_type, None);
    assert_eq!(packet.confidence, 45.68);
    assert_eq!(packet.scores.overall, 45.68);
    assert_eq!(packet.scores.motion, 30.0);
    assert_eq!(packet.ui_elements.progress, 26.7);
    assert_eq!(packet.frames_analyzed, 4);
    assert_eq!(packet.frame_count, 12);
    assert!(packet.timestamp.ends_with('Z'));
}

#[test]
fn test_packet_after_decision() {
    let packet =
        StreamPublisher::new().packet(&decided(Decision::Spoof, Some(AttackType::PhotoAttack)));
    assert_eq!(packet.status, SessionState::Spoof);
    assert_eq!(packet.result, Some(Decision::Spoof));
    assert_eq!(packet.attack_type, Some(AttackType::PhotoAttack));
    assert_eq!(packet.confidence, 87.65);
    assert_eq!(packet.ui_elements.progress, 100.0);
}

#[test]
fn test_packet_json_shape() {
    let message = StreamPublisher::new().message(&decided(Decision::Live, None));
    let json: serde_json::Value =
        serde_json::from_str(&message.to_json().expect("serialize failed")).expect("valid json");

    assert_eq!(json["status"], "LIVE");
    assert_eq!(json["result"], "LIVE");
    assert!(json["attack_type"].is_null());
    assert_eq!(json["finger_detected"], true);
    assert_eq!(json["frame"]["seq"], 9);
    assert_eq!(json["frame"]["width"], 640);
    assert_eq!(json["ui_elements"]["instruction"], "LIVE FINGER DETECTED");
    for key in [
        "motion",
        "texture",
        "edge_density",
        "color_variance",
        "pattern_detection",
        "consistency",
        "overall",
    ] {
        assert!(json["scores"][key].is_number(), "missing score {key}");
    }
    // packets carry no type tag
    assert!(json.get("type").is_none());
}

#[test]
fn test_side_messages_are_tagged() {
    let json = |m: ServerMessage| -> serde_json::Value {
        serde_json::from_str(&m.to_json().expect("serialize failed")).expect("valid json")
    };

    let hello = json(ServerMessage::connection("abc-1"));
    assert_eq!(hello["type"], "connection");
    assert_eq!(hello["session_id"], "abc-1");
    assert_eq!(hello["status"], "ready");
    assert_eq!(hello["commands"][0], "START_ANALYSIS");
    assert_eq!(hello["commands"].as_array().map(Vec::len), Some(5));

    let status = json(ServerMessage::status("Analysis reset"));
    assert_eq!(status["type"], "status");
    assert_eq!(status["message"], "Analysis reset");

    let error = json(ServerMessage::error(&LivenessError::InvalidCommand(
        "unknown command 'X'".to_string(),
    )));
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "invalid_command");
    assert_eq!(error["message"], "invalid command: unknown command 'X'");
}

#[test]
fn test_quality_messages() {
    let degraded = ServerMessage::quality(QualityChange::Degraded { rate: 0.35 });
    match degraded {
        ServerMessage::Side(liveness::SideMessage::Status { message }) => {
            assert!(message.contains("35%"), "{message}")
        }
        other => panic!("expected a status, got {other:?}"),
    }
    assert_eq!(
        ServerMessage::quality(QualityChange::Recovered { rate: 0.1 }),
        ServerMessage::status("Frame quality recovered")
    );
}
