use {
    super::{NEUTRAL, ops},
    crate::{FrameWindow, Plane, config::SignalConfig},
};

const LAPLACIAN: [f32; 9] = [0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0];

pub fn score(window: &FrameWindow, config: &SignalConfig) -> f64 {
    let variances: Vec<f64> = window
        .iter()
        .filter_map(|frame| laplacian_variance(&frame.luma))
        .collect();
    match ops::mean(&variances) {
        Some(v) => ops::ramp(v, config.texture_min, config.texture_optimal),
        None => NEUTRAL,
    }
}

/// Variance of the Laplacian over interior pixels; `None` below 3x3.
pub fn laplacian_variance(plane: &Plane) -> Option<f64> {
    let (w, h) = (plane.width, plane.height);
    if w < 3 || h < 3 {
        return None;
    }
    let lap = ops::convolve3(plane, &LAPLACIAN);
    let interior = (1..h - 1).flat_map(move |y| (1..w - 1).map(move |x| (x, y)));
    Some(ops::variance(interior.map(|(x, y)| lap.at(x, y) as f64)))
}
