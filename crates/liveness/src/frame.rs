use {
    crate::{LivenessError, config::SessionConfig},
    image::Image,
    serde::Serialize,
};

/// A single-channel f32 plane, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Plane {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_luma(width: usize, height: usize, luma: &[u8]) -> Self {
        Self::new(width, height, luma.iter().map(|&v| v as f32).collect())
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn same_size(&self, other: &Plane) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// A decoded frame at analysis resolution.
#[derive(Debug, Clone)]
pub struct Frame {
    pub seq: u64,
    /// Unix milliseconds at receipt.
    pub captured_at: u64,
    pub rgb: Image,
    pub luma: Plane,
    /// Size of the frame as the client sent it.
    pub source_width: usize,
    pub source_height: usize,
}

impl Frame {
    /// Build a frame straight from analysis-resolution pixels.
    pub fn from_image(seq: u64, captured_at: u64, rgb: Image) -> Self {
        let luma = Plane::from_luma(rgb.width(), rgb.height(), &rgb.to_luma());
        Self {
            seq,
            captured_at,
            source_width: rgb.width(),
            source_height: rgb.height(),
            rgb,
            luma,
        }
    }

    pub fn width(&self) -> usize {
        self.rgb.width()
    }

    pub fn height(&self) -> usize {
        self.rgb.height()
    }

    pub fn meta(&self) -> FrameMeta {
        FrameMeta {
            seq: self.seq,
            captured_at: self.captured_at,
            width: self.source_width,
            height: self.source_height,
        }
    }
}

/// Frame metadata echoed back in result packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameMeta {
    pub seq: u64,
    pub captured_at: u64,
    pub width: usize,
    pub height: usize,
}

/// What the transport handed over for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    Encoded(Vec<u8>),
    /// Refused by the transport; only the size is known.
    Oversized(usize),
}

/// Turns encoded frame bytes into sequenced analysis frames.
#[derive(Debug)]
pub struct FrameIngest {
    max_frame_bytes: usize,
    analysis_width: usize,
    analysis_height: usize,
    next_seq: u64,
}

impl FrameIngest {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            max_frame_bytes: config.max_frame_bytes,
            analysis_width: config.analysis_width,
            analysis_height: config.analysis_height,
            next_seq: 1,
        }
    }

    /// Decode one payload. On success returns the analysis frame and the
    /// full-resolution image it came from. Sequence numbers are only consumed
    /// by frames that decode.
    pub fn decode(
        &mut self,
        payload: &FramePayload,
        captured_at: u64,
    ) -> Result<(Frame, Image), LivenessError> {
        let bytes = match payload {
            FramePayload::Encoded(bytes) => bytes,
            FramePayload::Oversized(size) => {
                return Err(LivenessError::FrameTooLarge {
                    size: *size,
                    max: self.max_frame_bytes,
                });
            }
        };
        if bytes.len() > self.max_frame_bytes {
            return Err(LivenessError::FrameTooLarge {
                size: bytes.len(),
                max: self.max_frame_bytes,
            });
        }
        if bytes.is_empty() {
            return Err(LivenessError::Decode("empty frame".to_string()));
        }

        let full = image::decode_rgb8(bytes)?;
        let analysis = full.resize_to_fit(self.analysis_width, self.analysis_height);
        let mut frame = Frame::from_image(self.next_seq, captured_at, analysis);
        frame.source_width = full.width();
        frame.source_height = full.height();
        self.next_seq += 1;
        Ok((frame, full))
    }
}
