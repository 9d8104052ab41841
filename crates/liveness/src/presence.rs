use crate::{Frame, config::PresenceConfig};

/// Skin presence test with hysteresis.
///
/// Each frame gives a raw reading. The stable answer only flips after
/// `hysteresis_frames` consecutive readings disagree with it.
#[derive(Debug, Clone)]
pub struct PresenceGate {
    config: PresenceConfig,
    present: bool,
    streak: u32,
}

impl PresenceGate {
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            config,
            present: false,
            streak: 0,
        }
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn reset(&mut self) {
        self.present = false;
        self.streak = 0;
    }

    /// Feed one frame and return the stable presence.
    pub fn observe(&mut self, frame: &Frame) -> bool {
        let reading = self.detect(frame);
        self.update(reading)
    }

    /// Feed one raw reading and return the stable presence.
    pub fn update(&mut self, reading: bool) -> bool {
        if reading == self.present {
            self.streak = 0;
        } else {
            self.streak += 1;
            if self.streak >= self.config.hysteresis_frames {
                self.present = reading;
                self.streak = 0;
            }
        }
        self.present
    }

    /// Raw single-frame reading: enough skin pixels, and one region big enough.
    pub fn detect(&self, frame: &Frame) -> bool {
        let (w, h) = (frame.width(), frame.height());
        let total = w * h;
        if total == 0 {
            return false;
        }
        let mask: Vec<bool> = frame
            .rgb
            .data()
            .chunks_exact(3)
            .map(|px| self.is_skin(px[0], px[1], px[2]))
            .collect();
        let skin = mask.iter().filter(|&&m| m).count();
        if (skin as f64 / total as f64) < self.config.min_skin_ratio {
            return false;
        }
        let region = largest_region(&mask, w, h);
        region as f64 / total as f64 >= self.config.min_region_ratio
    }

    fn is_skin(&self, r: u8, g: u8, b: u8) -> bool {
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let y = 0.299 * r + 0.587 * g + 0.114 * b;
        let cb = 128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b;
        let cr = 128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b;
        let c = &self.config;
        y >= c.luma_min as f32
            && y <= c.luma_max as f32
            && cb >= c.cb_min as f32
            && cb <= c.cb_max as f32
            && cr >= c.cr_min as f32
            && cr <= c.cr_max as f32
    }
}

/// Size of the largest 4-connected `true` region.
fn largest_region(mask: &[bool], w: usize, h: usize) -> usize {
    let mut seen = vec![false; mask.len()];
    let mut largest = 0;
    let mut stack = Vec::new();
    for start in 0..mask.len() {
        if !mask[start] || seen[start] {
            continue;
        }
        seen[start] = true;
        stack.push(start);
        let mut size = 0;
        while let Some(i) = stack.pop() {
            size += 1;
            let (x, y) = (i % w, i / w);
            let mut visit = |j: usize| {
                if mask[j] && !seen[j] {
                    seen[j] = true;
                    stack.push(j);
                }
            };
            if x > 0 {
                visit(i - 1);
            }
            if x + 1 < w {
                visit(i + 1);
            }
            if y > 0 {
                visit(i - w);
            }
            if y + 1 < h {
                visit(i + w);
            }
        }
        largest = largest.max(size);
    }
    largest
}
