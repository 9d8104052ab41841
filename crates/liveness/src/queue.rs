use {
    crate::{Command, FramePayload, LivenessError},
    std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicBool, AtomicU64, Ordering},
        },
    },
    tokio::sync::Notify,
};

#[derive(Debug)]
pub enum SessionEvent {
    Frame {
        payload: FramePayload,
        received_at: u64,
    },
    /// A text message, parsed or not. Parse failures still answer in order.
    Command(Result<Command, LivenessError>),
    AutoReset(u64),
}

impl SessionEvent {
    fn is_frame(&self) -> bool {
        matches!(self, SessionEvent::Frame { .. })
    }
}

/// Ordered event queue between a connection reader and its session.
///
/// Commands and timer events are never dropped. At most `frame_capacity`
/// frames wait at any time; a new frame beyond that evicts the oldest
/// waiting frame, so the transport is never blocked by a slow session.
pub struct EventQueue {
    events: Mutex<VecDeque<SessionEvent>>,
    notify: Notify,
    frame_capacity: usize,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl EventQueue {
    pub fn new(frame_capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            frame_capacity: frame_capacity.max(1),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn push_frame(&self, payload: FramePayload, received_at: u64) {
        {
            let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
            let waiting = events.iter().filter(|e| e.is_frame()).count();
            if waiting >= self.frame_capacity {
                if let Some(oldest) = events.iter().position(SessionEvent::is_frame) {
                    events.remove(oldest);
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
            events.push_back(SessionEvent::Frame {
                payload,
                received_at,
            });
        }
        self.notify.notify_one();
    }

    pub fn push_command(&self, command: Result<Command, LivenessError>) {
        self.push(SessionEvent::Command(command));
    }

    pub fn push_auto_reset(&self, epoch: u64) {
        self.push(SessionEvent::AutoReset(epoch));
    }

    fn push(&self, event: SessionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(event);
        self.notify.notify_one();
    }

    /// Next event in arrival order, or `None` once the queue is closed.
    pub async fn pop(&self) -> Option<SessionEvent> {
        loop {
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            if let Some(event) = self
                .events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
            {
                return Some(event);
            }
            self.notify.notified().await;
        }
    }

    /// Stop the consumer. Pending events are discarded.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames evicted by overflow so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
