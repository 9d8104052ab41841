use {
    crate::LivenessError,
    serde::{Deserialize, Serialize},
};

/// Client commands, sent as `{"command": "<name>"}` in any letter case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    StartAnalysis,
    Reset,
    SaveResult,
    StopStream,
    ResumeStream,
}

#[derive(Deserialize)]
struct CommandEnvelope {
    command: String,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::StartAnalysis,
        Command::Reset,
        Command::SaveResult,
        Command::StopStream,
        Command::ResumeStream,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::StartAnalysis => "START_ANALYSIS",
            Command::Reset => "RESET",
            Command::SaveResult => "SAVE_RESULT",
            Command::StopStream => "STOP_STREAM",
            Command::ResumeStream => "RESUME_STREAM",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, LivenessError> {
        let upper = name.trim().to_ascii_uppercase();
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| LivenessError::InvalidCommand(format!("unknown command '{name}'")))
    }

    /// Parse a text message from the client.
    pub fn parse(text: &str) -> Result<Self, LivenessError> {
        let envelope: CommandEnvelope = serde_json::from_str(text)
            .map_err(|e| LivenessError::InvalidCommand(format!("malformed message: {e}")))?;
        Self::from_name(&envelope.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            Command::parse(r#"{"command":"start_analysis"}"#).unwrap(),
            Command::StartAnalysis
        );
        assert_eq!(
            Command::parse(r#"{"command":" Resume_Stream "}"#).unwrap(),
            Command::ResumeStream
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        let unknown = Command::parse(r#"{"command":"SELF_DESTRUCT"}"#).unwrap_err();
        assert_eq!(unknown.code(), "invalid_command");
        assert!(unknown.to_string().contains("SELF_DESTRUCT"));

        assert_eq!(Command::parse("not json").unwrap_err().code(), "invalid_command");
        assert_eq!(Command::parse(r#"{"cmd":"RESET"}"#).unwrap_err().code(), "invalid_command");
    }
}
