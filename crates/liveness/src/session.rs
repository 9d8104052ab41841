use {
    crate::{
        AttackClassifier, CaptureSource, Command, Frame, FrameIngest, FrameMeta, FramePayload,
        FrameWindow, LivenessError, PresenceGate, ScoreFusion, SignalExtractors, SignalScores,
        config::LivenessConfig,
        result::{AttackType, ConfidenceBand, Decision, DetectionResult, SessionState},
    },
    base::DateTime,
    image::Image,
    std::{collections::VecDeque, sync::Arc},
};

/// Per-session counters, logged when the session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub decode_errors: u64,
    pub saves: u32,
}

/// Crossing of the decode failure threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityChange {
    Degraded { rate: f64 },
    Recovered { rate: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotStarted,
    Paused,
}

/// Everything the publisher needs about one consumed frame.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub frame: FrameMeta,
    pub state: SessionState,
    pub finger_detected: bool,
    pub scores: SignalScores,
    pub overall: f64,
    pub frames_analyzed: u32,
    pub frame_count: u64,
    /// Percent of the minimum frame count reached.
    pub progress: f64,
    pub result: Option<DetectionResult>,
    /// This frame produced the decision.
    pub decided: bool,
}

#[derive(Debug)]
pub enum FrameOutcome {
    Dropped(DropReason),
    Rejected {
        error: LivenessError,
        quality: Option<QualityChange>,
    },
    Processed {
        report: TickReport,
        quality: Option<QualityChange>,
    },
}

#[derive(Debug)]
pub enum CommandOutcome {
    Status(String),
    Save(SaveRequest),
}

/// A snapshot handed to the persister.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub session_id: String,
    pub counter: u32,
    pub result: DetectionResult,
    pub image: Image,
}

/// Rolling decode failure rate over a fixed number of frames.
#[derive(Debug)]
struct DecodeHealth {
    outcomes: VecDeque<bool>,
    capacity: usize,
    threshold: f64,
    degraded: bool,
}

impl DecodeHealth {
    fn new(capacity: usize, threshold: f64) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            threshold,
            degraded: false,
        }
    }

    fn record(&mut self, failed: bool) -> Option<QualityChange> {
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(failed);
        let failures = self.outcomes.iter().filter(|&&f| f).count();
        let rate = failures as f64 / self.capacity as f64;
        if !self.degraded && rate > self.threshold {
            self.degraded = true;
            Some(QualityChange::Degraded { rate })
        } else if self.degraded && rate <= self.threshold {
            self.degraded = false;
            Some(QualityChange::Recovered { rate })
        } else {
            None
        }
    }
}

/// The state machine of one client session.
///
/// All methods run to completion; the caller serializes frames and commands
/// so that no two ever overlap for the same session.
pub struct SessionMachine {
    id: String,
    config: Arc<LivenessConfig>,
    state: SessionState,
    started: bool,
    paused: bool,
    ingest: FrameIngest,
    window: FrameWindow,
    gate: PresenceGate,
    extractors: SignalExtractors,
    fusion: ScoreFusion,
    classifier: AttackClassifier,
    capture: Box<dyn CaptureSource>,
    epoch: base::Epoch,
    frames_analyzed: u32,
    frame_count: u64,
    scores: SignalScores,
    overall: f64,
    result: Option<DetectionResult>,
    last_capture: Option<Image>,
    health: DecodeHealth,
    stats: SessionStats,
}

impl SessionMachine {
    pub fn new(
        id: impl Into<String>,
        config: Arc<LivenessConfig>,
        capture: Box<dyn CaptureSource>,
    ) -> Result<Self, LivenessError> {
        let fusion = ScoreFusion::new(&config.fusion)?;
        Ok(Self {
            id: id.into(),
            state: SessionState::Waiting,
            started: false,
            paused: false,
            ingest: FrameIngest::new(&config.session),
            window: FrameWindow::new(config.session.window_size),
            gate: PresenceGate::new(config.presence.clone()),
            extractors: SignalExtractors::new(config.signals.clone()),
            fusion,
            classifier: AttackClassifier::new(&config.classifier),
            capture,
            epoch: base::Epoch::new(),
            frames_analyzed: 0,
            frame_count: 0,
            scores: SignalScores::default(),
            overall: 0.0,
            result: None,
            last_capture: None,
            health: DecodeHealth::new(
                config.session.decode_error_window,
                config.session.decode_error_threshold,
            ),
            stats: SessionStats::default(),
            config,
        })
    }

    /// Swap in a custom attack rule list.
    pub fn with_classifier(mut self, classifier: AttackClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn accepts_frames(&self) -> bool {
        self.started && !self.paused
    }

    pub fn frames_analyzed(&self) -> u32 {
        self.frames_analyzed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn window(&self) -> &FrameWindow {
        &self.window
    }

    pub fn result(&self) -> Option<&DetectionResult> {
        self.result.as_ref()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Epoch value to hand to a timer armed right now.
    pub fn timer_epoch(&self) -> u64 {
        self.epoch.current()
    }

    pub fn is_timer_current(&self, epoch: u64) -> bool {
        self.epoch.is_current(epoch)
    }

    /// Frames lost before reaching the session, e.g. queue overflow.
    pub fn note_dropped(&mut self, count: u64) {
        self.stats.frames_received += count;
        self.stats.frames_dropped += count;
    }

    /// Decode one transport payload and run a tick on it.
    pub fn handle_frame(&mut self, payload: &FramePayload, captured_at: u64) -> FrameOutcome {
        self.stats.frames_received += 1;
        if !self.started {
            self.stats.frames_dropped += 1;
            return FrameOutcome::Dropped(DropReason::NotStarted);
        }
        if self.paused {
            self.stats.frames_dropped += 1;
            return FrameOutcome::Dropped(DropReason::Paused);
        }

        match self.ingest.decode(payload, captured_at) {
            Err(error) => {
                self.stats.decode_errors += 1;
                log::debug!("[{}] frame rejected: {}", self.id, error);
                let quality = self.health.record(true);
                FrameOutcome::Rejected { error, quality }
            }
            Ok((frame, full)) => {
                let quality = self.health.record(false);
                let report = self.tick(frame, full);
                FrameOutcome::Processed { report, quality }
            }
        }
    }

    /// Run one analysis tick on a decoded frame.
    pub fn tick(&mut self, frame: Frame, full: Image) -> TickReport {
        self.frame_count += 1;
        self.last_capture = Some(full);
        let present = self.gate.observe(&frame);
        let meta = frame.meta();

        let decided = match self.state {
            SessionState::Waiting if present => {
                self.window.clear();
                self.frames_analyzed = 0;
                self.transition(SessionState::Analyzing);
                self.analyze(frame)
            }
            SessionState::Analyzing if !present => {
                self.clear_analysis();
                self.transition(SessionState::Waiting);
                false
            }
            SessionState::Analyzing => self.analyze(frame),
            _ => false,
        };

        TickReport {
            frame: meta,
            state: self.state,
            finger_detected: present,
            scores: self.scores,
            overall: self.overall,
            frames_analyzed: self.frames_analyzed,
            frame_count: self.frame_count,
            progress: self.progress(),
            result: self.result.clone(),
            decided,
        }
    }

    fn analyze(&mut self, frame: Frame) -> bool {
        if let Err(e) = self.window.push(frame) {
            log::warn!("[{}] {}", self.id, e);
            return false;
        }
        self.frames_analyzed += 1;

        let scores = self.extractors.extract(&self.window);
        let outcome = self.fusion.fuse(&scores);
        self.scores = scores;
        self.overall = outcome.overall;

        if self.frames_analyzed < self.config.session.min_frames {
            return false;
        }

        let attack_type = match outcome.decision {
            Decision::Live => None,
            Decision::Spoof if outcome.vetoed => Some(AttackType::ScreenAttack),
            Decision::Spoof => Some(self.classifier.classify(&scores)),
        };
        let result = DetectionResult {
            session_id: self.id.clone(),
            timestamp: DateTime::now().to_iso(),
            overall: outcome.overall,
            scores,
            decision: outcome.decision,
            attack_type,
            frames_analyzed: self.frames_analyzed,
            confidence: outcome.overall,
            confidence_band: ConfidenceBand::from_confidence(outcome.overall),
            vetoed: outcome.vetoed,
        };
        log::info!(
            "[{}] decision {:?} overall {:.3} attack {:?} after {} frames",
            self.id,
            result.decision,
            result.overall,
            result.attack_type,
            result.frames_analyzed
        );
        self.result = Some(result);
        // a fresh epoch for the auto-reset timer
        self.epoch.advance();
        self.transition(outcome.decision.state());
        true
    }

    fn progress(&self) -> f64 {
        match self.state {
            SessionState::Waiting => 0.0,
            SessionState::Analyzing => {
                let min = self.config.session.min_frames.max(1) as f64;
                (self.frames_analyzed as f64 / min * 100.0).min(100.0)
            }
            SessionState::Live | SessionState::Spoof => 100.0,
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Result<CommandOutcome, LivenessError> {
        log::debug!("[{}] {} in {}", self.id, command.as_str(), self.state);
        match command {
            Command::StartAnalysis => self.start_analysis(),
            Command::Reset => {
                self.reset();
                Ok(CommandOutcome::Status("Analysis reset".to_string()))
            }
            Command::SaveResult => self.save_request(),
            Command::StopStream => {
                if !self.started {
                    return Err(invalid(command, "analysis has not been started"));
                }
                if self.paused {
                    return Err(invalid(command, "stream is already paused"));
                }
                self.paused = true;
                Ok(CommandOutcome::Status("Streaming paused".to_string()))
            }
            Command::ResumeStream => {
                if !self.paused {
                    return Err(invalid(command, "stream is not paused"));
                }
                self.paused = false;
                Ok(CommandOutcome::Status("Streaming resumed".to_string()))
            }
        }
    }

    fn start_analysis(&mut self) -> Result<CommandOutcome, LivenessError> {
        if !self.capture.is_open() {
            self.capture.open().map_err(|e| match e {
                LivenessError::CaptureUnavailable(_) => e,
                other => LivenessError::CaptureUnavailable(other.to_string()),
            })?;
            log::info!("[{}] capture '{}' opened", self.id, self.capture.name());
        }

        let message = if self.state.is_decided() {
            self.reset();
            "Analysis restarted"
        } else if self.accepts_frames() {
            "Analysis already active"
        } else {
            "Analysis started"
        };
        self.started = true;
        self.paused = false;
        Ok(CommandOutcome::Status(message.to_string()))
    }

    fn save_request(&mut self) -> Result<CommandOutcome, LivenessError> {
        if self.state != SessionState::Live {
            return Err(invalid(
                Command::SaveResult,
                format!("no live result to save in {}", self.state),
            ));
        }
        let (Some(result), Some(image)) = (self.result.clone(), self.last_capture.clone()) else {
            return Err(invalid(Command::SaveResult, "no frame captured"));
        };
        self.stats.saves += 1;
        Ok(CommandOutcome::Save(SaveRequest {
            session_id: self.id.clone(),
            counter: self.stats.saves,
            result,
            image,
        }))
    }

    /// Back to WAITING with an empty window, cancelling any pending auto-reset.
    pub fn reset(&mut self) {
        self.clear_analysis();
        self.result = None;
        self.frame_count = 0;
        self.gate.reset();
        self.epoch.advance();
        self.transition(SessionState::Waiting);
    }

    /// Fired by the auto-reset timer. Stale epochs are ignored.
    pub fn auto_reset(&mut self, epoch: u64) -> bool {
        if !self.epoch.is_current(epoch) || !self.state.is_decided() {
            log::debug!("[{}] stale auto-reset ignored", self.id);
            return false;
        }
        log::info!("[{}] auto-reset after result display", self.id);
        self.reset();
        true
    }

    /// Recover from an internal fault.
    pub fn force_reset(&mut self, reason: &str) {
        log::warn!("[{}] forced reset: {}", self.id, reason);
        self.reset();
    }

    /// Tear down on disconnect.
    pub fn close(&mut self) {
        self.epoch.advance();
        self.window.clear();
        self.last_capture = None;
        self.capture.close();
    }

    fn clear_analysis(&mut self) {
        self.window.clear();
        self.frames_analyzed = 0;
        self.scores = SignalScores::default();
        self.overall = 0.0;
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            log::info!("[{}] {} -> {}", self.id, self.state, to);
            self.state = to;
        }
    }
}

fn invalid(command: Command, reason: impl Into<String>) -> LivenessError {
    LivenessError::InvalidState {
        command,
        reason: reason.into(),
    }
}
