use {crate::command::Command, com::ComError, image::ImageError, std::fmt};

#[derive(Debug)]
pub enum LivenessError {
    Decode(String),
    FrameTooLarge { size: usize, max: usize },
    InvalidCommand(String),
    InvalidState { command: Command, reason: String },
    CaptureUnavailable(String),
    Persist(String),
    Config(String),
    Transport(ComError),
    Internal(String),
}

impl LivenessError {
    /// Stable identifier sent to clients in `error` messages.
    pub fn code(&self) -> &'static str {
        match self {
            LivenessError::Decode(_) => "decode_error",
            LivenessError::FrameTooLarge { .. } => "frame_too_large",
            LivenessError::InvalidCommand(_) => "invalid_command",
            LivenessError::InvalidState { .. } => "invalid_state",
            LivenessError::CaptureUnavailable(_) => "capture_unavailable",
            LivenessError::Persist(_) => "persist_failed",
            LivenessError::Config(_) => "config_error",
            LivenessError::Transport(_) => "transport_error",
            LivenessError::Internal(_) => "internal_error",
        }
    }

    /// Decode failures and oversized frames count against frame quality
    /// instead of being reported one by one.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            LivenessError::Decode(_) | LivenessError::FrameTooLarge { .. }
        )
    }
}

impl fmt::Display for LivenessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LivenessError::Decode(msg) => write!(f, "frame decode failed: {msg}"),
            LivenessError::FrameTooLarge { size, max } => {
                write!(f, "frame of {size} bytes exceeds limit of {max} bytes")
            }
            LivenessError::InvalidCommand(msg) => write!(f, "invalid command: {msg}"),
            LivenessError::InvalidState { command, reason } => {
                write!(f, "{} not allowed: {reason}", command.as_str())
            }
            LivenessError::CaptureUnavailable(msg) => write!(f, "capture unavailable: {msg}"),
            LivenessError::Persist(msg) => write!(f, "save failed: {msg}"),
            LivenessError::Config(msg) => write!(f, "invalid configuration: {msg}"),
            LivenessError::Transport(err) => write!(f, "transport error: {err}"),
            LivenessError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for LivenessError {}

impl From<ImageError> for LivenessError {
    fn from(err: ImageError) -> Self {
        LivenessError::Decode(err.to_string())
    }
}

impl From<ComError> for LivenessError {
    fn from(err: ComError) -> Self {
        LivenessError::Transport(err)
    }
}

impl From<serde_json::Error> for LivenessError {
    fn from(err: serde_json::Error) -> Self {
        LivenessError::Internal(format!("json: {err}"))
    }
}
