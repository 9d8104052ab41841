//! The six liveness signals.
//!
//! Every extractor is a pure function of the frame window returning a score
//! in [0, 1], higher meaning more live. Windows too small or frames too tiny
//! to measure produce `NEUTRAL` instead of an error.

pub mod color;
pub mod consistency;
pub mod edge;
pub mod motion;
pub mod ops;
pub mod pattern;
pub mod texture;

use {
    crate::{FrameWindow, config::SignalConfig},
    pattern::PatternDetector,
    serde::{Deserialize, Serialize},
};

pub const NEUTRAL: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalScores {
    pub motion: f64,
    pub texture: f64,
    pub consistency: f64,
    pub edge_density: f64,
    pub color_variance: f64,
    pub pattern_detection: f64,
}

impl SignalScores {
    pub fn neutral() -> Self {
        Self::uniform(NEUTRAL)
    }

    pub fn uniform(value: f64) -> Self {
        Self {
            motion: value,
            texture: value,
            consistency: value,
            edge_density: value,
            color_variance: value,
            pattern_detection: value,
        }
    }

    /// Scores in fusion-weight order.
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
}

/// All six extractors behind one configuration.
pub struct SignalExtractors {
    config: SignalConfig,
    pattern: PatternDetector,
}

impl SignalExtractors {
    pub fn new(config: SignalConfig) -> Self {
        let pattern = PatternDetector::new(config.fft_size);
        Self { config, pattern }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn extract(&self, window: &FrameWindow) -> SignalScores {
        if window.is_empty() {
            return SignalScores::neutral();
        }
        SignalScores {
            motion: motion::score(window, &self.config),
            texture: texture::score(window, &self.config),
            consistency: consistency::score(window, &self.config),
            edge_density: edge::score(window, &self.config),
            color_variance: color::score(window, &self.config),
            pattern_detection: self.pattern.score(window, &self.config),
        }
    }
}
