use {
    super::{NEUTRAL, ops},
    crate::{FrameWindow, Plane, config::SignalConfig},
    rustfft::{Fft, FftPlanner, num_complex::Complex32},
    std::sync::Arc,
};

/// Periodic-structure detector on the 2D spectrum of the latest frame.
///
/// Print dot screens and display pixel grids put a sharp peak into the
/// spectrum away from DC. The peak-to-mean magnitude ratio grows with that
/// structure and the score falls with it.
pub struct PatternDetector {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
}

impl PatternDetector {
    pub fn new(size: usize) -> Self {
        let size = size.max(2);
        let mut planner = FftPlanner::new();
        Self {
            size,
            fft: planner.plan_fft_forward(size),
        }
    }

    pub fn score(&self, window: &FrameWindow, config: &SignalConfig) -> f64 {
        let Some(frame) = window.latest() else {
            return NEUTRAL;
        };
        match self.peak_ratio(&frame.luma, config.fft_dc_radius) {
            Some(ratio) => ratio_score(ratio, config.pattern_threshold),
            None => NEUTRAL,
        }
    }

    /// `max / (mean + 1)` of the DC-suppressed magnitude spectrum.
    pub fn peak_ratio(&self, plane: &Plane, dc_radius: usize) -> Option<f64> {
        if plane.width < 2 || plane.height < 2 {
            return None;
        }
        let n = self.size;
        let samples = ops::resample_square(plane, n);
        let mut buffer: Vec<Complex32> = samples
            .into_iter()
            .map(|v| Complex32::new(v, 0.0))
            .collect();

        // rows, then columns through a transpose
        self.fft.process(&mut buffer);
        let mut transposed = vec![Complex32::new(0.0, 0.0); n * n];
        for y in 0..n {
            for x in 0..n {
                transposed[x * n + y] = buffer[y * n + x];
            }
        }
        self.fft.process(&mut transposed);

        let freq = |k: usize| k.min(n - k);
        let mut max = 0.0f64;
        let mut sum = 0.0f64;
        for v in 0..n {
            for u in 0..n {
                let magnitude = if freq(u) <= dc_radius && freq(v) <= dc_radius {
                    0.0
                } else {
                    transposed[v * n + u].norm() as f64
                };
                max = max.max(magnitude);
                sum += magnitude;
            }
        }
        let mean = sum / (n * n) as f64;
        Some(max / (mean + 1.0))
    }
}

/// 0.2 at or above the threshold, otherwise falling linearly from 1.
pub fn ratio_score(ratio: f64, threshold: f64) -> f64 {
    if ratio >= threshold {
        0.2
    } else {
        ops::clamp_unit(1.0 - ratio / threshold * 0.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_plane_has_no_pattern() {
        let detector = PatternDetector::new(32);
        let plane = Plane::new(40, 30, vec![180.0; 1200]);
        let ratio = detector.peak_ratio(&plane, 2).unwrap();
        assert!(ratio < 0.5, "ratio {ratio}");
        assert!(ratio_score(ratio, 50.0) > 0.99);
    }

    #[test]
    fn test_grating_is_detected() {
        let detector = PatternDetector::new(32);
        // 4-pixel period stripes, well away from DC
        let data = (0..32 * 32)
            .map(|i| if (i % 32) / 2 % 2 == 0 { 40.0 } else { 220.0 })
            .collect();
        let plane = Plane::new(32, 32, data);
        let ratio = detector.peak_ratio(&plane, 2).unwrap();
        assert!(ratio > 50.0, "ratio {ratio}");
        assert_eq!(ratio_score(ratio, 50.0), 0.2);
    }

    #[test]
    fn test_ratio_score_is_linear_below_threshold() {
        assert!((ratio_score(25.0, 50.0) - 0.6).abs() < 1e-9);
    }
}
