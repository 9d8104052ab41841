use {
    crate::signals::SignalScores,
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    Waiting,
    Analyzing,
    Live,
    Spoof,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Waiting => "WAITING",
            SessionState::Analyzing => "ANALYZING",
            SessionState::Live => "LIVE",
            SessionState::Spoof => "SPOOF",
        }
    }

    pub fn is_decided(&self) -> bool {
        matches!(self, SessionState::Live | SessionState::Spoof)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Live,
    Spoof,
}

impl Decision {
    pub fn state(&self) -> SessionState {
        match self {
            Decision::Live => SessionState::Live,
            Decision::Spoof => SessionState::Spoof,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    PhotoAttack,
    ScreenAttack,
    VideoReplay,
    FakeFinger,
    Unknown,
}

impl AttackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackType::PhotoAttack => "photo_attack",
            AttackType::ScreenAttack => "screen_attack",
            AttackType::VideoReplay => "video_replay",
            AttackType::FakeFinger => "fake_finger",
            AttackType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.85 {
            ConfidenceBand::High
        } else if confidence >= 0.70 {
            ConfidenceBand::Medium
        } else if confidence >= 0.50 {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::VeryLow
        }
    }
}

/// The outcome of one completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub session_id: String,
    /// ISO-8601 UTC with milliseconds.
    pub timestamp: String,
    pub overall: f64,
    pub scores: SignalScores,
    pub decision: Decision,
    pub attack_type: Option<AttackType>,
    pub frames_analyzed: u32,
    pub confidence: f64,
    pub confidence_band: ConfidenceBand,
    /// The screen veto forced this decision.
    pub vetoed: bool,
}
