use crate::{ComError, ws::WsMessage};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio_websockets::{ClientBuilder, MaybeTlsStream, WebSocketStream};

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl WsClient {
    /// Connect to a WsServer and return a WsClient.
    pub async fn connect(addr: SocketAddr) -> Result<Self, ComError> {
        let uri = format!("ws://{}", addr);

        let parsed_uri: http::Uri = uri.parse().map_err(|e| {
            ComError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid WebSocket URI: {e}"),
            ))
        })?;
        let (stream, _response) = ClientBuilder::from_uri(parsed_uri).connect().await?;

        Ok(Self { stream })
    }

    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), ComError> {
        self.stream
            .send(WsMessage::Text(text.into()).into_message())
            .await?;
        Ok(())
    }

    pub async fn send_binary(&mut self, data: Vec<u8>) -> Result<(), ComError> {
        self.stream
            .send(WsMessage::Binary(data).into_message())
            .await?;
        Ok(())
    }

    /// Receive the next text or binary message from the server.
    ///
    /// Returns `ComError::ConnectionClosed` if the server closes the connection.
    pub async fn recv(&mut self) -> Result<WsMessage, ComError> {
        loop {
            match self.stream.next().await {
                Some(Ok(msg)) => {
                    if msg.is_close() {
                        return Err(ComError::ConnectionClosed);
                    }
                    if let Some(message) = WsMessage::from_message(msg) {
                        return Ok(message);
                    }
                }
                Some(Err(e)) => return Err(ComError::from(e)),
                None => return Err(ComError::ConnectionClosed),
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), ComError> {
        self.stream.close().await?;
        Ok(())
    }
}
