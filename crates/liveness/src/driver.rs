use {
    crate::{
        CommandOutcome, EventQueue, FrameOutcome, FramePayload, LivenessError, ResultPersister,
        SaveRequest, ServerMessage, SessionEvent, SessionMachine, SessionStats, SideMessage,
        StreamPublisher,
    },
    std::{
        sync::{Arc, Mutex, MutexGuard},
        time::Duration,
    },
    tokio::{sync::mpsc, task::JoinHandle},
};

/// Runs one session: pops events in arrival order and answers on `outbound`.
///
/// Frame decoding and the analysis tick run on the blocking pool with the
/// machine locked, so ticks never overlap. A panic inside a tick poisons the
/// lock; the driver recovers the machine and forces it back to WAITING.
pub struct SessionDriver {
    session_id: String,
    machine: Arc<Mutex<SessionMachine>>,
    queue: Arc<EventQueue>,
    outbound: mpsc::Sender<ServerMessage>,
    persister: Arc<ResultPersister>,
    publisher: StreamPublisher,
    auto_reset_delay: Duration,
    timer: Option<(u64, JoinHandle<()>)>,
}

impl SessionDriver {
    pub fn new(
        machine: SessionMachine,
        queue: Arc<EventQueue>,
        outbound: mpsc::Sender<ServerMessage>,
        persister: Arc<ResultPersister>,
    ) -> Self {
        Self {
            session_id: machine.id().to_string(),
            auto_reset_delay: machine.config().session.auto_reset_delay(),
            machine: Arc::new(Mutex::new(machine)),
            queue,
            outbound,
            persister,
            publisher: StreamPublisher::new(),
            timer: None,
        }
    }

    /// Shared handle for inspecting the machine from outside.
    pub fn machine(&self) -> Arc<Mutex<SessionMachine>> {
        self.machine.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SessionMachine> {
        self.machine.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub async fn run(mut self) -> SessionStats {
        let greeting = ServerMessage::connection(&self.session_id);
        let mut open = self.send(greeting).await;

        while open {
            let Some(event) = self.queue.pop().await else {
                break;
            };
            open = match event {
                SessionEvent::Frame {
                    payload,
                    received_at,
                } => self.on_frame(payload, received_at).await,
                SessionEvent::Command(Err(e)) => self.send(ServerMessage::error(&e)).await,
                SessionEvent::Command(Ok(command)) => {
                    let outcome = self.lock().handle_command(command);
                    match outcome {
                        Ok(CommandOutcome::Status(message)) => {
                            self.send(ServerMessage::status(message)).await
                        }
                        Ok(CommandOutcome::Save(request)) => {
                            self.spawn_save(request);
                            true
                        }
                        Err(e) => {
                            log::info!("[{}] {}", self.session_id, e);
                            self.send(ServerMessage::error(&e)).await
                        }
                    }
                }
                SessionEvent::AutoReset(epoch) => {
                    let reset = self.lock().auto_reset(epoch);
                    if reset {
                        self.send(ServerMessage::status("Ready for next analysis"))
                            .await
                    } else {
                        true
                    }
                }
            };
            self.cancel_stale_timer();
        }

        if let Some((_, handle)) = self.timer.take() {
            handle.abort();
        }
        let stats = {
            let mut machine = self.lock();
            machine.note_dropped(self.queue.dropped());
            machine.close();
            machine.stats()
        };
        log::info!(
            "[{}] session closed: {} frames received, {} dropped, {} decode errors, {} saves",
            self.session_id,
            stats.frames_received,
            stats.frames_dropped,
            stats.decode_errors,
            stats.saves
        );
        stats
    }

    async fn on_frame(&mut self, payload: FramePayload, received_at: u64) -> bool {
        // skip the blocking pool for frames that will be dropped anyway
        {
            let mut machine = self.lock();
            if !machine.accepts_frames() {
                machine.handle_frame(&payload, received_at);
                return true;
            }
        }

        let machine = self.machine.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let mut machine = machine.lock().unwrap_or_else(|e| e.into_inner());
            let outcome = machine.handle_frame(&payload, received_at);
            (outcome, machine.timer_epoch())
        })
        .await;

        let (outcome, epoch) = match joined {
            Ok(result) => result,
            Err(e) => return self.fault(format!("frame processing failed: {e}")).await,
        };

        match outcome {
            FrameOutcome::Dropped(_) => true,
            FrameOutcome::Rejected { error, quality } => {
                if let Some(change) = quality {
                    log::warn!("[{}] {:?}", self.session_id, change);
                    if !self.send(ServerMessage::quality(change)).await {
                        return false;
                    }
                }
                if error.is_frame_error() {
                    true
                } else {
                    self.send(ServerMessage::error(&error)).await
                }
            }
            FrameOutcome::Processed { report, quality } => {
                if let Some(change) = quality {
                    log::info!("[{}] {:?}", self.session_id, change);
                    if !self.send(ServerMessage::quality(change)).await {
                        return false;
                    }
                }
                if report.decided {
                    self.arm_timer(epoch);
                }
                self.send(self.publisher.message(&report)).await
            }
        }
    }

    /// Put the session back in WAITING and tell the client.
    async fn fault(&mut self, reason: String) -> bool {
        log::error!("[{}] {}", self.session_id, reason);
        self.lock().force_reset(&reason);
        let error = LivenessError::Internal(reason);
        self.send(ServerMessage::error(&error)).await
    }

    fn arm_timer(&mut self, epoch: u64) {
        if let Some((_, handle)) = self.timer.take() {
            handle.abort();
        }
        let queue = self.queue.clone();
        let delay = self.auto_reset_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.push_auto_reset(epoch);
        });
        self.timer = Some((epoch, handle));
    }

    fn cancel_stale_timer(&mut self) {
        let stale = match &self.timer {
            Some((epoch, _)) => !self.lock().is_timer_current(*epoch),
            None => false,
        };
        if stale {
            if let Some((_, handle)) = self.timer.take() {
                handle.abort();
            }
        }
    }

    /// Persist off the event loop; the reply arrives whenever the write ends.
    fn spawn_save(&self, request: SaveRequest) {
        let persister = self.persister.clone();
        let outbound = self.outbound.clone();
        tokio::spawn(async move {
            let message = match persister.save(request).await {
                Ok(artifact) => ServerMessage::Side(SideMessage::SaveResult {
                    message: "Result saved".to_string(),
                    filename: artifact.image_path.display().to_string(),
                    metadata_file: artifact.metadata_path.display().to_string(),
                    save_count: artifact.save_count,
                }),
                Err(e) => {
                    log::warn!("{}", e);
                    ServerMessage::error(&e)
                }
            };
            outbound.send(message).await.ok();
        });
    }

    async fn send(&self, message: ServerMessage) -> bool {
        self.outbound.send(message).await.is_ok()
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.timer.take() {
            handle.abort();
        }
    }
}
