use {
    super::{NEUTRAL, ops},
    crate::{FrameWindow, Plane, config::SignalConfig},
};

/// Mean luma-histogram correlation of consecutive frames. A single pair
/// below the discontinuity threshold caps the score.
pub fn score(window: &FrameWindow, config: &SignalConfig) -> f64 {
    let histograms: Vec<Vec<f64>> = window
        .iter()
        .map(|frame| histogram(&frame.luma, config.histogram_bins))
        .collect();
    let correlations: Vec<f64> = histograms
        .iter()
        .zip(histograms.iter().skip(1))
        .map(|(a, b)| correlation(a, b))
        .collect();

    let Some(mean) = ops::mean(&correlations) else {
        return NEUTRAL;
    };
    let score = ops::clamp_unit(mean);
    if correlations
        .iter()
        .any(|&c| c < config.discontinuity_threshold)
    {
        score.min(config.discontinuity_cap)
    } else {
        score
    }
}

/// Normalized luma histogram over 0..=255.
pub fn histogram(plane: &Plane, bins: usize) -> Vec<f64> {
    let bins = bins.max(1);
    let mut hist = vec![0.0f64; bins];
    if plane.is_empty() {
        return hist;
    }
    for &v in &plane.data {
        let bin = ((v.clamp(0.0, 255.0) as usize) * bins / 256).min(bins - 1);
        hist[bin] += 1.0;
    }
    let total = plane.len() as f64;
    hist.iter_mut().for_each(|h| *h /= total);
    hist
}

/// Pearson correlation. Identical flat inputs correlate at 1.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (var_a * var_b).sqrt();
    if denom < 1e-12 {
        return if a[..n] == b[..n] { 1.0 } else { 0.0 };
    }
    cov / denom
}
