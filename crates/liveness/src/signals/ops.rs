use crate::Plane;

/// Piecewise-linear ramp: 0 to 0.5 below `min`, 0.5 to 1 up to `optimal`,
/// then saturated at 1.
pub fn ramp(value: f64, min: f64, optimal: f64) -> f64 {
    let score = if value >= optimal {
        1.0
    } else if value >= min {
        0.5 + 0.5 * (value - min) / (optimal - min)
    } else {
        0.5 * value / min
    };
    clamp_unit(score)
}

/// Straight line from `floor` (0) to `ceiling` (1).
pub fn linear(value: f64, floor: f64, ceiling: f64) -> f64 {
    clamp_unit((value - floor) / (ceiling - floor))
}

/// Clamp to [0, 1], mapping non-finite values to the neutral midpoint.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        super::NEUTRAL
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population variance.
pub fn variance(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let (count, sum) = values.clone().fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if count == 0 {
        return 0.0;
    }
    let mean = sum / count as f64;
    values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64
}

/// 3x3 convolution over the interior; the one-pixel border is left at zero.
pub fn convolve3(plane: &Plane, kernel: &[f32; 9]) -> Plane {
    let (w, h) = (plane.width, plane.height);
    let mut out = vec![0.0f32; w * h];
    if w < 3 || h < 3 {
        return Plane::new(w, h, out);
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = 0.0;
            for ky in 0..3 {
                for kx in 0..3 {
                    acc += kernel[ky * 3 + kx] * plane.at(x + kx - 1, y + ky - 1);
                }
            }
            out[y * w + x] = acc;
        }
    }
    Plane::new(w, h, out)
}

/// Separable 5-tap binomial blur with clamped borders.
pub fn blur5(plane: &Plane) -> Plane {
    const TAPS: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];
    let (w, h) = (plane.width, plane.height);
    if w == 0 || h == 0 {
        return plane.clone();
    }
    let mut tmp = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, tap) in TAPS.iter().enumerate() {
                let sx = (x as isize + i as isize - 2).clamp(0, w as isize - 1) as usize;
                acc += tap * plane.at(sx, y);
            }
            tmp[y * w + x] = acc;
        }
    }
    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, tap) in TAPS.iter().enumerate() {
                let sy = (y as isize + i as isize - 2).clamp(0, h as isize - 1) as usize;
                acc += tap * tmp[sy * w + x];
            }
            out[y * w + x] = acc;
        }
    }
    Plane::new(w, h, out)
}

/// Sobel derivatives `(gx, gy)`.
pub fn sobel(plane: &Plane) -> (Plane, Plane) {
    const GX: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
    const GY: [f32; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];
    (convolve3(plane, &GX), convolve3(plane, &GY))
}

/// Bilinear resample to `size` x `size`.
pub fn resample_square(plane: &Plane, size: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(size * size);
    if plane.is_empty() || size == 0 {
        return out;
    }
    let sx = plane.width as f32 / size as f32;
    let sy = plane.height as f32 / size as f32;
    for y in 0..size {
        let fy = ((y as f32 + 0.5) * sy - 0.5).clamp(0.0, (plane.height - 1) as f32);
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(plane.height - 1);
        let ty = fy - y0 as f32;
        for x in 0..size {
            let fx = ((x as f32 + 0.5) * sx - 0.5).clamp(0.0, (plane.width - 1) as f32);
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(plane.width - 1);
            let tx = fx - x0 as f32;
            let top = plane.at(x0, y0) * (1.0 - tx) + plane.at(x1, y0) * tx;
            let bottom = plane.at(x0, y1) * (1.0 - tx) + plane.at(x1, y1) * tx;
            out.push(top * (1.0 - ty) + bottom * ty);
        }
    }
    out
}
