use {
    super::{NEUTRAL, ops},
    crate::{Frame, FrameWindow, config::SignalConfig},
};

/// Variance of the per-channel means, averaged over the window. Uniformly
/// backlit screens push the three means together.
pub fn score(window: &FrameWindow, config: &SignalConfig) -> f64 {
    let variances: Vec<f64> = window.iter().filter_map(channel_mean_variance).collect();
    match ops::mean(&variances) {
        Some(v) => ops::ramp(v, config.color_min, config.color_optimal),
        None => NEUTRAL,
    }
}

pub fn channel_mean_variance(frame: &Frame) -> Option<f64> {
    let data = frame.rgb.data();
    let pixels = data.len() / 3;
    if pixels == 0 {
        return None;
    }
    let mut sums = [0u64; 3];
    for px in data.chunks_exact(3) {
        sums[0] += px[0] as u64;
        sums[1] += px[1] as u64;
        sums[2] += px[2] as u64;
    }
    let means = sums.map(|s| s as f64 / pixels as f64);
    Some(ops::variance(means.into_iter()))
}
