mod client;
mod server;

pub use client::WsClient;
pub use server::{
    TRANSPORT_HEADROOM, WsConnection, WsReader, WsServer, WsWriter, transport_limit,
};

use tokio_websockets::Message;

/// An application-level WebSocket message. Control frames never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl WsMessage {
    pub fn len(&self) -> usize {
        match self {
            WsMessage::Text(text) => text.len(),
            WsMessage::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn into_message(self) -> Message {
        match self {
            WsMessage::Text(text) => Message::text(text),
            WsMessage::Binary(data) => Message::binary(data),
        }
    }

    /// Convert an incoming frame, or `None` for ping/pong.
    pub(crate) fn from_message(msg: Message) -> Option<Self> {
        if msg.is_text() {
            msg.as_text().map(|text| WsMessage::Text(text.to_string()))
        } else if msg.is_binary() {
            Some(WsMessage::Binary(msg.into_payload().to_vec()))
        } else {
            None
        }
    }
}
