use crate::LivenessError;

/// Where a session's frames come from.
///
/// START_ANALYSIS opens the source; a failure is reported to the client as
/// `capture_unavailable` and leaves the session waiting.
pub trait CaptureSource: Send {
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<(), LivenessError>;

    fn close(&mut self) {}

    fn is_open(&self) -> bool;
}

/// Frames pushed by the client over its WebSocket. Always available.
#[derive(Debug, Default)]
pub struct StreamCapture {
    open: bool,
}

impl StreamCapture {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureSource for StreamCapture {
    fn name(&self) -> &str {
        "websocket"
    }

    fn open(&mut self) -> Result<(), LivenessError> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
