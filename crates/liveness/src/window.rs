use {
    crate::{Frame, LivenessError},
    std::collections::VecDeque,
};

/// The most recent frames of a session, oldest first.
///
/// Holds at most `capacity` frames with strictly increasing sequence numbers;
/// pushing into a full window evicts the oldest frame.
#[derive(Debug, Clone)]
pub struct FrameWindow {
    capacity: usize,
    frames: VecDeque<Frame>,
}

impl FrameWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a frame, returning the evicted one if the window was full.
    pub fn push(&mut self, frame: Frame) -> Result<Option<Frame>, LivenessError> {
        if let Some(last) = self.frames.back() {
            if frame.seq <= last.seq {
                return Err(LivenessError::Internal(format!(
                    "frame {} pushed after frame {}",
                    frame.seq, last.seq
                )));
            }
        }
        let evicted = if self.frames.len() == self.capacity {
            self.frames.pop_front()
        } else {
            None
        };
        self.frames.push_back(frame);
        Ok(evicted)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Frame> {
        self.frames.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Consecutive `(older, newer)` frame pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&Frame, &Frame)> {
        self.frames.iter().zip(self.frames.iter().skip(1))
    }
}
