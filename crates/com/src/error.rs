use std::fmt;

#[derive(Debug)]
pub enum ComError {
    Io(std::io::Error),
    ConnectionClosed,
    MessageTooLarge(usize),
    /// Above the transport limit; the stream cannot be read any further.
    PayloadRejected { len: usize, max: usize },
    WebSocket(tokio_websockets::Error),
}

impl fmt::Display for ComError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComError::Io(err) => write!(f, "io error: {err}"),
            ComError::ConnectionClosed => write!(f, "connection closed"),
            ComError::MessageTooLarge(len) => write!(f, "message too large: {len} bytes"),
            ComError::PayloadRejected { len, max } => {
                write!(f, "payload of {len} bytes exceeds the transport limit of {max}")
            }
            ComError::WebSocket(err) => write!(f, "websocket error: {err}"),
        }
    }
}

impl std::error::Error for ComError {}

impl ComError {
    /// Whether the connection can keep being read after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ComError::MessageTooLarge(_))
    }
}

impl From<std::io::Error> for ComError {
    fn from(err: std::io::Error) -> Self {
        ComError::Io(err)
    }
}

impl From<tokio_websockets::Error> for ComError {
    fn from(err: tokio_websockets::Error) -> Self {
        match err {
            tokio_websockets::Error::PayloadTooLong { len, max_len } => {
                ComError::PayloadRejected { len, max: max_len }
            }
            err => ComError::WebSocket(err),
        }
    }
}
