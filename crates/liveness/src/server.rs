use {
    crate::{
        Command, EventQueue, FramePayload, LivenessError, ResultPersister, ServerMessage,
        SessionDriver, SessionMachine, StreamCapture, config::LivenessConfig,
    },
    base::unix_millis,
    com::{ComError, WsConnection, WsMessage, WsServer},
    std::{
        net::SocketAddr,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
    },
    tokio::sync::mpsc,
};

const OUTBOUND_CAPACITY: usize = 32;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-name safe, unique within the process.
fn next_session_id() -> String {
    let n = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{:x}-{}", unix_millis(), n)
}

/// WebSocket front end: one independent session per connection.
pub struct LivenessServer {
    ws: WsServer,
    config: Arc<LivenessConfig>,
    persister: Arc<ResultPersister>,
}

impl LivenessServer {
    pub async fn bind(config: LivenessConfig) -> Result<Self, LivenessError> {
        config.validate()?;
        let ws = WsServer::bind(config.server.addr.as_str(), config.session.max_frame_bytes).await?;
        let persister = Arc::new(ResultPersister::new(&config.persist.output_dir));
        log::info!("Liveness server listening on {}", ws.local_addr());
        Ok(Self {
            ws,
            config: Arc::new(config),
            persister,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.ws.local_addr()
    }

    pub fn active_sessions(&self) -> usize {
        self.ws.client_count()
    }

    /// Accept connections until the listener fails.
    pub async fn run(mut self) -> Result<(), LivenessError> {
        loop {
            let connection = self.ws.accept().await?;
            let config = self.config.clone();
            let persister = self.persister.clone();
            tokio::spawn(async move {
                let peer = connection.peer_addr();
                if let Err(e) = serve_connection(connection, config, persister).await {
                    log::warn!("Session for {} ended with error: {}", peer, e);
                }
            });
        }
    }
}

/// Serve one client until it disconnects.
pub async fn serve_connection(
    connection: WsConnection,
    config: Arc<LivenessConfig>,
    persister: Arc<ResultPersister>,
) -> Result<(), LivenessError> {
    let session_id = next_session_id();
    let peer = connection.peer_addr();
    log::info!("[{}] connected from {}", session_id, peer);

    let machine = SessionMachine::new(session_id.clone(), config.clone(), Box::new(StreamCapture::new()))?;
    let (mut reader, mut writer) = connection.split();

    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_CAPACITY);
    let writer_session = session_id.clone();
    let writer_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    log::error!("[{}] cannot serialize message: {}", writer_session, e);
                    continue;
                }
            };
            if let Err(e) = writer.send_text(text).await {
                log::debug!("[{}] send failed: {}", writer_session, e);
                break;
            }
        }
        writer.close().await.ok();
    });

    let queue = Arc::new(EventQueue::new(config.session.queue_capacity));
    let driver = SessionDriver::new(machine, queue.clone(), tx, persister);
    let driver_task = tokio::spawn(driver.run());

    let read_result = loop {
        if driver_task.is_finished() {
            break Ok(());
        }
        match reader.recv().await {
            Ok(WsMessage::Text(text)) => queue.push_command(Command::parse(&text)),
            Ok(WsMessage::Binary(data)) => {
                queue.push_frame(FramePayload::Encoded(data), unix_millis())
            }
            Err(ComError::MessageTooLarge(size)) => {
                queue.push_frame(FramePayload::Oversized(size), unix_millis())
            }
            Err(ComError::ConnectionClosed) => break Ok(()),
            Err(e) => break Err(LivenessError::from(e)),
        }
    };

    queue.close();
    match driver_task.await {
        Ok(_) => {}
        Err(e) => log::error!("[{}] session task failed: {}", session_id, e),
    }
    writer_task.await.ok();
    log::info!("[{}] disconnected", session_id);
    read_result
}
