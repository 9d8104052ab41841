use crate::{
    LivenessError,
    config::{FusionConfig, FusionWeights},
    result::Decision,
    signals::{SignalScores, ops},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionOutcome {
    pub overall: f64,
    pub decision: Decision,
    /// The screen veto overrode the threshold.
    pub vetoed: bool,
}

/// Weighted sum of the six signal scores against a decision threshold.
#[derive(Debug, Clone)]
pub struct ScoreFusion {
    weights: [f64; 6],
    threshold: f64,
    screen_veto: Option<f64>,
}

impl ScoreFusion {
    pub fn new(config: &FusionConfig) -> Result<Self, LivenessError> {
        let weights = config.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(LivenessError::Config(
                "fusion weights must be non-negative".to_string(),
            ));
        }
        let sum = config.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(LivenessError::Config(format!(
                "fusion weights must sum to 1.0, got {sum}"
            )));
        }
        if !(0.0..=1.0).contains(&config.threshold) {
            return Err(LivenessError::Config(format!(
                "fusion threshold {} outside [0, 1]",
                config.threshold
            )));
        }
        Ok(Self {
            weights,
            threshold: config.threshold,
            screen_veto: config.screen_veto,
        })
    }

    pub fn with_defaults() -> Self {
        let defaults = FusionWeights::default();
        Self {
            weights: defaults.as_array(),
            threshold: FusionConfig::default().threshold,
            screen_veto: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Overall score in [0, 1], non-decreasing in every input.
    pub fn overall(&self, scores: &SignalScores) -> f64 {
        let sum: f64 = scores
            .as_array()
            .iter()
            .zip(&self.weights)
            .map(|(s, w)| ops::clamp_unit(*s) * w)
            .sum();
        sum.clamp(0.0, 1.0)
    }

    pub fn fuse(&self, scores: &SignalScores) -> FusionOutcome {
        let overall = self.overall(scores);
        let vetoed = self
            .screen_veto
            .is_some_and(|floor| ops::clamp_unit(scores.color_variance) < floor);
        let decision = if !vetoed && overall >= self.threshold {
            Decision::Live
        } else {
            Decision::Spoof
        };
        FusionOutcome {
            overall,
            decision,
            vetoed,
        }
    }
}
