use {
    crate::{
        Command, FrameMeta, LivenessError,
        result::{AttackType, Decision, SessionState},
        session::{QualityChange, TickReport},
    },
    base::DateTime,
    serde::Serialize,
};

pub const INSTRUCTION_WAITING: &str = "Show your finger to camera";
pub const INSTRUCTION_COLLECTING: &str = "Collecting frames...";
pub const INSTRUCTION_LOW_MOTION: &str = "Please move your finger slightly";
pub const INSTRUCTION_GOOD_MOTION: &str = "Good! Continue...";
pub const INSTRUCTION_ANALYZING: &str = "Analyzing liveness...";
pub const INSTRUCTION_LIVE: &str = "LIVE FINGER DETECTED";
pub const INSTRUCTION_SPOOF: &str = "SPOOF DETECTED";

const COLLECTING_FRAMES: u32 = 3;
const LOW_MOTION: f64 = 0.10;
const GOOD_MOTION: f64 = 0.60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireScores {
    pub motion: f64,
    pub texture: f64,
    pub edge_density: f64,
    pub color_variance: f64,
    pub pattern_detection: f64,
    pub consistency: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiElements {
    pub instruction: String,
    pub progress: f64,
}

/// One packet per consumed frame. Scores and confidence are percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPacket {
    pub timestamp: String,
    pub frame_count: u64,
    pub status: SessionState,
    pub finger_detected: bool,
    pub scores: WireScores,
    pub result: Option<Decision>,
    pub attack_type: Option<AttackType>,
    pub confidence: f64,
    pub ui_elements: UiElements,
    pub frames_analyzed: u32,
    pub frame: FrameMeta,
}

/// Out-of-band messages, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SideMessage {
    Connection {
        message: String,
        status: String,
        session_id: String,
        commands: Vec<&'static str>,
    },
    Status {
        message: String,
    },
    Error {
        code: &'static str,
        message: String,
    },
    SaveResult {
        message: String,
        filename: String,
        metadata_file: String,
        save_count: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Packet(Box<ResultPacket>),
    Side(SideMessage),
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, LivenessError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn connection(session_id: &str) -> Self {
        ServerMessage::Side(SideMessage::Connection {
            message: "Connected to liveness server".to_string(),
            status: "ready".to_string(),
            session_id: session_id.to_string(),
            commands: Command::ALL.iter().map(Command::as_str).collect(),
        })
    }

    pub fn status(message: impl Into<String>) -> Self {
        ServerMessage::Side(SideMessage::Status {
            message: message.into(),
        })
    }

    pub fn error(err: &LivenessError) -> Self {
        ServerMessage::Side(SideMessage::Error {
            code: err.code(),
            message: err.to_string(),
        })
    }

    pub fn quality(change: QualityChange) -> Self {
        match change {
            QualityChange::Degraded { rate } => Self::status(format!(
                "Frame quality degraded: {:.0}% of recent frames failed to decode",
                rate * 100.0
            )),
            QualityChange::Recovered { .. } => Self::status("Frame quality recovered"),
        }
    }
}

/// Builds result packets from tick reports.
#[derive(Debug, Clone, Default)]
pub struct StreamPublisher;

impl StreamPublisher {
    pub fn new() -> Self {
        Self
    }

    pub fn packet(&self, report: &TickReport) -> ResultPacket {
        let decided = report.result.as_ref().filter(|_| report.state.is_decided());
        let confidence = decided.map(|r| r.confidence).unwrap_or(report.overall);
        let s = &report.scores;
        ResultPacket {
            timestamp: DateTime::now().to_iso(),
            frame_count: report.frame_count,
            status: report.state,
            finger_detected: report.finger_detected,
            scores: WireScores {
                motion: percent(s.motion),
                texture: percent(s.texture),
                edge_density: percent(s.edge_density),
                color_variance: percent(s.color_variance),
                pattern_detection: percent(s.pattern_detection),
                consistency: percent(s.consistency),
                overall: percent(report.overall),
            },
            result: decided.map(|r| r.decision),
            attack_type: decided.and_then(|r| r.attack_type),
            confidence: percent(confidence),
            ui_elements: UiElements {
                instruction: instruction(report),
                progress: (report.progress * 10.0).round() / 10.0,
            },
            frames_analyzed: report.frames_analyzed,
            frame: report.frame,
        }
    }

    pub fn message(&self, report: &TickReport) -> ServerMessage {
        ServerMessage::Packet(Box::new(self.packet(report)))
    }
}

/// Score in [0, 1] as a percentage with two decimals.
pub fn percent(score: f64) -> f64 {
    (score * 10000.0).round() / 100.0
}

pub fn instruction(report: &TickReport) -> String {
    match report.state {
        SessionState::Waiting => INSTRUCTION_WAITING.to_string(),
        SessionState::Analyzing => {
            if report.frames_analyzed < COLLECTING_FRAMES {
                INSTRUCTION_COLLECTING.to_string()
            } else if report.scores.motion < LOW_MOTION {
                INSTRUCTION_LOW_MOTION.to_string()
            } else if report.scores.motion >= GOOD_MOTION {
                INSTRUCTION_GOOD_MOTION.to_string()
            } else {
                format!(
                    "{} {}%",
                    INSTRUCTION_ANALYZING,
                    (report.overall * 100.0) as u32
                )
            }
        }
        SessionState::Live => INSTRUCTION_LIVE.to_string(),
        SessionState::Spoof => spoof_instruction(report.result.as_ref().and_then(|r| r.attack_type))
            .to_string(),
    }
}

pub fn spoof_instruction(attack: Option<AttackType>) -> &'static str {
    match attack {
        Some(AttackType::PhotoAttack) => "Photo/Print detected - Use real finger",
        Some(AttackType::ScreenAttack) => "Screen detected - Use real finger",
        Some(AttackType::VideoReplay) => "Video replay detected - Use real finger",
        Some(AttackType::FakeFinger) => "Fake finger detected - Use real finger",
        Some(AttackType::Unknown) | None => INSTRUCTION_SPOOF,
    }
}
