pub mod error;
pub mod ws;

pub use error::ComError;
pub use ws::{
    TRANSPORT_HEADROOM, WsClient, WsConnection, WsMessage, WsReader, WsServer, WsWriter,
    transport_limit,
};
