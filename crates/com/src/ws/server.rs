use {
    crate::{ComError, ws::WsMessage},
    base::log,
    futures_util::{
        SinkExt, StreamExt,
        stream::{SplitSink, SplitStream},
    },
    std::{
        collections::HashSet,
        net::SocketAddr,
        sync::{Arc, Mutex},
    },
    tokio::{
        net::{TcpListener, TcpStream, ToSocketAddrs},
        sync::mpsc,
        task::JoinHandle,
    },
    tokio_websockets::{Limits, Message, ServerBuilder, WebSocketStream},
};

/// Multiple of the message limit the transport still reads in full. Larger
/// payloads fail the stream.
pub const TRANSPORT_HEADROOM: usize = 4;

type Registry = Arc<Mutex<HashSet<SocketAddr>>>;

/// Removes the peer from the registry once both halves of a connection are gone.
struct ClientGuard {
    addr: SocketAddr,
    registry: Registry,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        registry.remove(&self.addr);
    }
}

pub struct WsServer {
    clients: Registry,
    rx: mpsc::Receiver<WsConnection>,
    _accept_task: JoinHandle<()>,
    local_addr: SocketAddr,
}

pub fn transport_limit(max_message_size: usize) -> usize {
    max_message_size.saturating_mul(TRANSPORT_HEADROOM)
}

impl WsServer {
    /// Bind a TCP listener and start accepting WebSocket connections.
    ///
    /// A background task performs the handshake for every incoming TCP
    /// connection and queues the result for `accept()`. Application messages
    /// larger than `max_message_size` are reported as
    /// `ComError::MessageTooLarge` by the reader without closing the connection.
    /// Past `max_message_size * TRANSPORT_HEADROOM` the payload is refused
    /// before it is buffered and the reader fails with
    /// `ComError::PayloadRejected`.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        max_message_size: usize,
    ) -> Result<Self, ComError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let limits =
            Limits::default().max_payload_len(Some(transport_limit(max_message_size)));

        let clients: Registry = Arc::new(Mutex::new(HashSet::new()));
        let clients_clone = clients.clone();

        let (tx, rx) = mpsc::channel(64);

        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((tcp_stream, addr)) => {
                        let tx = tx.clone();
                        let registry = clients_clone.clone();
                        // handshake off the accept loop so a slow client cannot stall others
                        tokio::spawn(async move {
                            let builder = ServerBuilder::new().limits(limits);
                            let ws_stream = match builder.accept(tcp_stream).await {
                                Ok((_request, ws_stream)) => ws_stream,
                                Err(e) => {
                                    log::warn!("WebSocket handshake failed for {}: {}", addr, e);
                                    return;
                                }
                            };

                            registry
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .insert(addr);
                            let guard = ClientGuard { addr, registry };

                            let connection = WsConnection {
                                peer: addr,
                                stream: ws_stream,
                                max_message_size,
                                guard,
                            };
                            if tx.send(connection).await.is_err() {
                                log::debug!("Server dropped before {} was accepted", addr);
                            }
                        });
                    }
                    Err(e) => {
                        log::warn!("Accept error: {}", e);
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    }
                }
            }
        });

        Ok(Self {
            clients,
            rx,
            _accept_task: accept_task,
            local_addr,
        })
    }

    /// Wait for the next connection that completed its handshake.
    pub async fn accept(&mut self) -> Result<WsConnection, ComError> {
        self.rx.recv().await.ok_or(ComError::ConnectionClosed)
    }

    /// Return the number of currently connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Return the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for WsServer {
    fn drop(&mut self) {
        self._accept_task.abort();
    }
}

/// One accepted WebSocket client.
pub struct WsConnection {
    peer: SocketAddr,
    stream: WebSocketStream<TcpStream>,
    max_message_size: usize,
    guard: ClientGuard,
}

impl WsConnection {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Split into independently owned read and write halves.
    pub fn split(self) -> (WsReader, WsWriter) {
        let (sink, stream) = self.stream.split();
        let guard = Arc::new(self.guard);
        (
            WsReader {
                peer: self.peer,
                stream,
                max_message_size: self.max_message_size,
                _guard: guard.clone(),
            },
            WsWriter {
                peer: self.peer,
                sink,
                _guard: guard,
            },
        )
    }
}

pub struct WsReader {
    peer: SocketAddr,
    stream: SplitStream<WebSocketStream<TcpStream>>,
    max_message_size: usize,
    _guard: Arc<ClientGuard>,
}

impl WsReader {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Receive the next text or binary message from the client.
    ///
    /// Ping and pong frames are skipped. A close frame or end of stream yields
    /// `ComError::ConnectionClosed`. An oversized message yields
    /// `ComError::MessageTooLarge`; reading may continue afterwards.
    pub async fn recv(&mut self) -> Result<WsMessage, ComError> {
        loop {
            match self.stream.next().await {
                Some(Ok(msg)) => {
                    if msg.is_close() {
                        return Err(ComError::ConnectionClosed);
                    }
                    if let Some(message) = WsMessage::from_message(msg) {
                        if message.len() > self.max_message_size {
                            return Err(ComError::MessageTooLarge(message.len()));
                        }
                        return Ok(message);
                    }
                }
                Some(Err(e)) => return Err(ComError::from(e)),
                None => return Err(ComError::ConnectionClosed),
            }
        }
    }
}

pub struct WsWriter {
    peer: SocketAddr,
    sink: SplitSink<WebSocketStream<TcpStream>, Message>,
    _guard: Arc<ClientGuard>,
}

impl WsWriter {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub async fn send(&mut self, message: WsMessage) -> Result<(), ComError> {
        self.sink.send(message.into_message()).await?;
        Ok(())
    }

    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), ComError> {
        self.send(WsMessage::Text(text.into())).await
    }

    pub async fn send_binary(&mut self, data: Vec<u8>) -> Result<(), ComError> {
        self.send(WsMessage::Binary(data)).await
    }

    /// Send a close frame and flush.
    pub async fn close(&mut self) -> Result<(), ComError> {
        self.sink.close().await?;
        Ok(())
    }
}
