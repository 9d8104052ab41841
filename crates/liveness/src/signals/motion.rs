use {
    super::{NEUTRAL, ops},
    crate::{FrameWindow, Plane, config::SignalConfig},
};

/// Mean normal-flow magnitude over consecutive pairs, mapped linearly between
/// the configured floor and ceiling.
pub fn score(window: &FrameWindow, config: &SignalConfig) -> f64 {
    match magnitude(window) {
        Some(m) => ops::linear(m, config.motion_floor, config.motion_ceiling),
        None => NEUTRAL,
    }
}

/// Average normal-flow magnitude in pixels per frame, `None` without a
/// usable pair.
pub fn magnitude(window: &FrameWindow) -> Option<f64> {
    let flows: Vec<f64> = window
        .pairs()
        .filter_map(|(prev, next)| normal_flow(&prev.luma, &next.luma))
        .collect();
    ops::mean(&flows)
}

/// Least-squares normal flow between two planes.
///
/// From the brightness constancy constraint `It + v . grad(I) = 0`, the flow
/// component along the gradient at each pixel is `|It| / |grad(I)|`. Weighting
/// each pixel by `|grad(I)|^2` gives `sum(|It| |grad(I)|) / sum(|grad(I)|^2)`,
/// which ignores flat regions where motion is unobservable.
///
/// Both planes are standardized first, so a global brightness or gain change
/// between them (screen refresh, backlight flicker) cancels out of `It`.
fn normal_flow(prev: &Plane, next: &Plane) -> Option<f64> {
    if !prev.same_size(next) || prev.width < 3 || prev.height < 3 {
        return None;
    }
    let (w, h) = (prev.width, prev.height);
    let prev = standardized(prev);
    let next = standardized(next);
    let at = |plane: &[f64], x: usize, y: usize| plane[y * w + x];
    let avg = |x: usize, y: usize| 0.5 * (at(&prev, x, y) + at(&next, x, y));

    let mut weighted = 0.0f64;
    let mut energy = 0.0f64;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let ix = 0.5 * (avg(x + 1, y) - avg(x - 1, y));
            let iy = 0.5 * (avg(x, y + 1) - avg(x, y - 1));
            let it = at(&next, x, y) - at(&prev, x, y);
            let grad2 = ix * ix + iy * iy;
            weighted += it.abs() * grad2.sqrt();
            energy += grad2;
        }
    }
    Some(weighted / (energy + 1e-6))
}

/// Zero mean and unit contrast. A flat plane only loses its mean.
fn standardized(plane: &Plane) -> Vec<f64> {
    let n = plane.data.len() as f64;
    let mean = plane.data.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = plane
        .data
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let std = variance.sqrt();
    let scale = if std > 1e-6 { 1.0 / std } else { 1.0 };
    plane
        .data
        .iter()
        .map(|&v| (v as f64 - mean) * scale)
        .collect()
}
