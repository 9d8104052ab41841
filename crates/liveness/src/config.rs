use {
    crate::LivenessError,
    serde::{Deserialize, Serialize},
    std::{path::Path, time::Duration},
};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Calibration of the six signal extractors.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Normal-flow magnitude (pixels per frame) that scores 0.
    pub motion_floor: f64,
    /// Normal-flow magnitude that scores 1.
    pub motion_ceiling: f64,
    pub texture_min: f64,
    pub texture_optimal: f64,
    pub histogram_bins: usize,
    /// Histogram correlation below which a frame pair counts as a cut.
    pub discontinuity_threshold: f64,
    /// Consistency score ceiling once a cut is seen.
    pub discontinuity_cap: f64,
    pub canny_low: f32,
    pub canny_high: f32,
    pub edge_min: f64,
    pub edge_max: f64,
    /// Edge ratio above `edge_max` over which the score falls to zero.
    pub edge_excess_span: f64,
    pub color_min: f64,
    pub color_optimal: f64,
    pub fft_size: usize,
    pub fft_dc_radius: usize,
    pub pattern_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            motion_floor: 0.05,
            motion_ceiling: 0.6,
            texture_min: 150.0,
            texture_optimal: 300.0,
            histogram_bins: 32,
            discontinuity_threshold: 0.5,
            discontinuity_cap: 0.2,
            canny_low: 50.0,
            canny_high: 150.0,
            edge_min: 0.15,
            edge_max: 0.35,
            edge_excess_span: 0.3,
            color_min: 50.0,
            color_optimal: 300.0,
            fft_size: 64,
            fft_dc_radius: 3,
            pattern_threshold: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FusionWeights {
    pub motion: f64,
    pub texture: f64,
    pub consistency: f64,
    pub edge_density: f64,
    pub color_variance: f64,
    pub pattern_detection: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            motion: 0.35,
            texture: 0.25,
            consistency: 0.15,
            edge_density: 0.10,
            color_variance: 0.10,
            pattern_detection: 0.05,
        }
    }
}

impl FusionWeights {
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.motion,
            self.texture,
            self.consistency,
            self.edge_density,
            self.color_variance,
            self.pattern_detection,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FusionConfig {
    pub weights: FusionWeights,
    pub threshold: f64,
    /// Color variance score below which the decision is forced to SPOOF.
    pub screen_veto: Option<f64>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            threshold: 0.60,
            screen_veto: None,
        }
    }
}

/// Thresholds used by the default attack rules.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub screen_color_max: f64,
    pub screen_consistency_min: f64,
    pub screen_pattern_max: f64,
    pub photo_motion_max: f64,
    pub photo_texture_max: f64,
    pub replay_consistency_max: f64,
    pub fake_edge_max: f64,
    pub fake_texture_max: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            screen_color_max: 0.30,
            screen_consistency_min: 0.60,
            screen_pattern_max: 0.40,
            photo_motion_max: 0.20,
            photo_texture_max: 0.50,
            replay_consistency_max: 0.40,
            fake_edge_max: 0.30,
            fake_texture_max: 0.40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub cb_min: u8,
    pub cb_max: u8,
    pub cr_min: u8,
    pub cr_max: u8,
    pub luma_min: u8,
    pub luma_max: u8,
    /// Fraction of skin pixels required.
    pub min_skin_ratio: f64,
    /// Largest 4-connected skin region as a fraction of the frame.
    pub min_region_ratio: f64,
    /// Consecutive agreeing readings needed to flip presence.
    pub hysteresis_frames: u32,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            cb_min: 77,
            cb_max: 127,
            cr_min: 133,
            cr_max: 173,
            luma_min: 40,
            luma_max: 240,
            min_skin_ratio: 0.20,
            min_region_ratio: 0.10,
            hysteresis_frames: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub window_size: usize,
    pub min_frames: u32,
    pub auto_reset_ms: u64,
    /// Frames allowed to wait in a session queue before the oldest is dropped.
    pub queue_capacity: usize,
    pub decode_error_window: usize,
    pub decode_error_threshold: f64,
    pub max_frame_bytes: usize,
    pub analysis_width: usize,
    /// Tall frames are capped here so portrait input stays bounded too.
    pub analysis_height: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            min_frames: 15,
            auto_reset_ms: 3000,
            queue_capacity: 4,
            decode_error_window: 20,
            decode_error_threshold: 0.3,
            max_frame_bytes: 10 * 1024 * 1024,
            analysis_width: 160,
            analysis_height: 160,
        }
    }
}

impl SessionConfig {
    pub fn auto_reset_delay(&self) -> Duration {
        Duration::from_millis(self.auto_reset_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistConfig {
    pub output_dir: String,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            output_dir: "results".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Log to day-rolling files here instead of stdout.
    pub log_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8765".to_string(),
            log_dir: None,
        }
    }
}

/// Complete engine configuration, immutable once a server is running.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub signals: SignalConfig,
    pub fusion: FusionConfig,
    pub classifier: ClassifierConfig,
    pub presence: PresenceConfig,
    pub session: SessionConfig,
    pub persist: PersistConfig,
    pub server: ServerConfig,
}

impl LivenessConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LivenessError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LivenessError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, LivenessError> {
        let config: LivenessConfig =
            serde_json::from_str(text).map_err(|e| LivenessError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LivenessError> {
        let weights = self.fusion.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(config_error("fusion weights must be non-negative"));
        }
        let sum = self.fusion.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(config_error(format!(
                "fusion weights must sum to 1.0, got {sum}"
            )));
        }
        check_unit("fusion.threshold", self.fusion.threshold)?;
        if let Some(veto) = self.fusion.screen_veto {
            check_unit("fusion.screen_veto", veto)?;
        }

        let s = &self.signals;
        check_range("motion", s.motion_floor, s.motion_ceiling)?;
        check_range("texture", s.texture_min, s.texture_optimal)?;
        check_range("edge", s.edge_min, s.edge_max)?;
        check_range("color", s.color_min, s.color_optimal)?;
        if s.motion_floor < 0.0 || s.texture_min <= 0.0 || s.edge_min <= 0.0 || s.color_min <= 0.0
        {
            return Err(config_error("signal lower bounds must be positive"));
        }
        if s.edge_excess_span <= 0.0 || s.pattern_threshold <= 0.0 {
            return Err(config_error(
                "edge_excess_span and pattern_threshold must be positive",
            ));
        }
        if s.histogram_bins < 2 {
            return Err(config_error("histogram_bins must be at least 2"));
        }
        check_unit("signals.discontinuity_threshold", s.discontinuity_threshold)?;
        check_unit("signals.discontinuity_cap", s.discontinuity_cap)?;
        if !(s.canny_low >= 0.0 && s.canny_low <= s.canny_high) {
            return Err(config_error("canny_low must not exceed canny_high"));
        }
        if s.fft_size < 8 || s.fft_dc_radius >= s.fft_size / 2 {
            return Err(config_error(
                "fft_size must be at least 8 and larger than twice fft_dc_radius",
            ));
        }

        let p = &self.presence;
        if p.cb_min > p.cb_max || p.cr_min > p.cr_max || p.luma_min > p.luma_max {
            return Err(config_error("presence bands must have min <= max"));
        }
        check_unit("presence.min_skin_ratio", p.min_skin_ratio)?;
        check_unit("presence.min_region_ratio", p.min_region_ratio)?;
        if p.hysteresis_frames == 0 {
            return Err(config_error("presence.hysteresis_frames must be at least 1"));
        }

        let se = &self.session;
        if se.window_size < 2 {
            return Err(config_error("session.window_size must be at least 2"));
        }
        if se.min_frames == 0 || se.queue_capacity == 0 || se.decode_error_window == 0 {
            return Err(config_error(
                "min_frames, queue_capacity and decode_error_window must be positive",
            ));
        }
        check_unit("session.decode_error_threshold", se.decode_error_threshold)?;
        if se.max_frame_bytes == 0 || se.analysis_width < 8 || se.analysis_height < 8 {
            return Err(config_error(
                "max_frame_bytes must be positive and analysis_width/analysis_height at least 8",
            ));
        }
        Ok(())
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.fusion.threshold = threshold;
        self
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.fusion.weights = weights;
        self
    }

    pub fn with_screen_veto(mut self, floor: Option<f64>) -> Self {
        self.fusion.screen_veto = floor;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.session.window_size = window_size;
        self
    }

    pub fn with_min_frames(mut self, min_frames: u32) -> Self {
        self.session.min_frames = min_frames;
        self
    }

    pub fn with_auto_reset(mut self, delay: Duration) -> Self {
        self.session.auto_reset_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.session.queue_capacity = capacity;
        self
    }

    pub fn with_max_frame_bytes(mut self, max: usize) -> Self {
        self.session.max_frame_bytes = max;
        self
    }

    pub fn with_hysteresis(mut self, frames: u32) -> Self {
        self.presence.hysteresis_frames = frames;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.persist.output_dir = dir.into();
        self
    }

    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.server.addr = addr.into();
        self
    }
}

fn config_error(msg: impl Into<String>) -> LivenessError {
    LivenessError::Config(msg.into())
}

fn check_unit(name: &str, value: f64) -> Result<(), LivenessError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(config_error(format!("{name} must be within [0, 1], got {value}")))
    }
}

fn check_range(name: &str, low: f64, high: f64) -> Result<(), LivenessError> {
    if low.is_finite() && high.is_finite() && low < high {
        Ok(())
    } else {
        Err(config_error(format!(
            "{name} calibration needs lower < upper, got {low} and {high}"
        )))
    }
}
