use {
    super::{NEUTRAL, ops},
    crate::{FrameWindow, Plane, config::SignalConfig},
};

/// Canny edge ratio averaged over the window and scored against the target
/// band: inside it scores 1, too few edges fall off linearly to 0, too many
/// fall off over `edge_excess_span`.
pub fn score(window: &FrameWindow, config: &SignalConfig) -> f64 {
    let ratios: Vec<f64> = window
        .iter()
        .filter_map(|frame| edge_ratio(&frame.luma, config.canny_low, config.canny_high))
        .collect();
    match ops::mean(&ratios) {
        Some(ratio) => band_score(ratio, config),
        None => NEUTRAL,
    }
}

pub fn band_score(ratio: f64, config: &SignalConfig) -> f64 {
    let score = if ratio < config.edge_min {
        ratio / config.edge_min
    } else if ratio <= config.edge_max {
        1.0
    } else {
        1.0 - (ratio - config.edge_max) / config.edge_excess_span
    };
    ops::clamp_unit(score)
}

/// Fraction of pixels marked as edges by Canny; `None` below 3x3.
pub fn edge_ratio(plane: &Plane, low: f32, high: f32) -> Option<f64> {
    if plane.width < 3 || plane.height < 3 {
        return None;
    }
    let edges = canny(plane, low, high);
    let count = edges.iter().filter(|&&e| e).count();
    Some(count as f64 / edges.len() as f64)
}

/// Gaussian blur, Sobel gradients (L1 magnitude), non-maximum suppression
/// and hysteresis thresholding.
fn canny(plane: &Plane, low: f32, high: f32) -> Vec<bool> {
    let (w, h) = (plane.width, plane.height);
    if w < 3 || h < 3 {
        return vec![false; w * h];
    }
    let blurred = ops::blur5(plane);
    let (gx, gy) = ops::sobel(&blurred);
    let magnitude: Vec<f32> = gx
        .data
        .iter()
        .zip(&gy.data)
        .map(|(x, y)| x.abs() + y.abs())
        .collect();

    // 0: strong, 1: weak, 2: none
    let mut class = vec![2u8; w * h];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let m = magnitude[i];
            if m < low || m == 0.0 {
                continue;
            }
            let (n1, n2) = neighbours_along_gradient(x, y, w, gx.data[i], gy.data[i]);
            if m < magnitude[n1] || m < magnitude[n2] {
                continue;
            }
            class[i] = if m >= high { 0 } else { 1 };
        }
    }

    let mut edges = vec![false; w * h];
    let mut stack: Vec<usize> = (0..w * h).filter(|&i| class[i] == 0).collect();
    for &i in &stack {
        edges[i] = true;
    }
    while let Some(i) = stack.pop() {
        let (x, y) = (i % w, i / w);
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if class[j] == 1 && !edges[j] {
                    edges[j] = true;
                    stack.push(j);
                }
            }
        }
    }
    edges
}

/// Indices of the two neighbours along the quantized gradient direction.
fn neighbours_along_gradient(x: usize, y: usize, w: usize, gx: f32, gy: f32) -> (usize, usize) {
    let angle = gy.atan2(gx).to_degrees();
    let angle = if angle < 0.0 { angle + 180.0 } else { angle };
    let (dx, dy): (isize, isize) = if !(22.5..157.5).contains(&angle) {
        (1, 0)
    } else if angle < 67.5 {
        (1, 1)
    } else if angle < 112.5 {
        (0, 1)
    } else {
        (-1, 1)
    };
    let at = |dx: isize, dy: isize| {
        ((y as isize + dy) as usize) * w + (x as isize + dx) as usize
    };
    (at(dx, dy), at(-dx, -dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_plane(w: usize, h: usize) -> Plane {
        let data = (0..w * h)
            .map(|i| if i % w < w / 2 { 20.0 } else { 220.0 })
            .collect();
        Plane::new(w, h, data)
    }

    #[test]
    fn test_canny_flat_plane_has_no_edges() {
        let plane = Plane::new(20, 20, vec![128.0; 400]);
        assert!(canny(&plane, 50.0, 150.0).iter().all(|e| !e));
    }

    #[test]
    fn test_canny_step_gives_thin_vertical_line() {
        let (w, h) = (20, 12);
        let edges = canny(&step_plane(w, h), 50.0, 150.0);
        let row = 6;
        let marked: Vec<usize> = (0..w).filter(|&x| edges[row * w + x]).collect();
        assert!(!marked.is_empty());
        assert!(marked.len() <= 2, "edge not thinned: {marked:?}");
        assert!(marked.iter().all(|&x| x == w / 2 - 1 || x == w / 2));
    }

    #[test]
    fn test_canny_tiny_plane_has_no_edges() {
        let plane = Plane::new(2, 5, vec![0.0, 255.0, 0.0, 255.0, 0.0, 255.0, 0.0, 255.0, 0.0, 255.0]);
        assert_eq!(canny(&plane, 50.0, 150.0), vec![false; 10]);
        assert!(canny(&Plane::new(0, 0, Vec::new()), 50.0, 150.0).is_empty());
    }

    #[test]
    fn test_band_score_shape() {
        let config = SignalConfig::default();
        assert_eq!(band_score(0.0, &config), 0.0);
        assert_eq!(band_score(0.25, &config), 1.0);
        assert!((band_score(0.075, &config) - 0.5).abs() < 1e-9);
        assert!((band_score(0.50, &config) - 0.5).abs() < 1e-9);
        assert_eq!(band_score(0.9, &config), 0.0);
    }
}
