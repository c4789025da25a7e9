//! FIFO (First-In-First-Out) replacement policy.
//!
//! Evicts the frame that has been eligible the longest. There is no
//! reference bit: a frame that is pinned and unpinned again rejoins at the
//! back of the queue.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::buffer::replacer::Replacer;
use crate::common::FrameId;

struct FifoState {
    /// Eligible frames in the order they became eligible (front = oldest).
    queue: VecDeque<FrameId>,

    /// `tracked[i]` is true iff frame `i` is in `queue`.
    tracked: Vec<bool>,
}

/// A simple FIFO eviction policy.
pub struct FifoReplacer {
    state: Mutex<FifoState>,
    num_frames: usize,
}

impl FifoReplacer {
    /// Create a replacer for frames `0..num_frames`.
    pub fn new(num_frames: usize) -> Self {
        Self {
            state: Mutex::new(FifoState {
                queue: VecDeque::with_capacity(num_frames),
                tracked: vec![false; num_frames],
            }),
            num_frames,
        }
    }

    fn in_range(&self, frame_id: FrameId) -> bool {
        if frame_id.index() < self.num_frames {
            return true;
        }
        log::warn!(
            "fifo replacer ignoring {} (tracks {} frames)",
            frame_id,
            self.num_frames
        );
        false
    }
}

impl Replacer for FifoReplacer {
    fn victim(&self) -> Option<FrameId> {
        let mut state = self.state.lock();
        let frame_id = state.queue.pop_front()?;
        state.tracked[frame_id.index()] = false;
        log::trace!("fifo victim {}", frame_id);
        Some(frame_id)
    }

    fn pin(&self, frame_id: FrameId) {
        if !self.in_range(frame_id) {
            return;
        }
        let mut state = self.state.lock();
        if !state.tracked[frame_id.index()] {
            return;
        }
        // O(n) in the number of tracked frames.
        if let Some(pos) = state.queue.iter().position(|&f| f == frame_id) {
            state.queue.remove(pos);
        }
        state.tracked[frame_id.index()] = false;
    }

    fn unpin(&self, frame_id: FrameId) {
        if !self.in_range(frame_id) {
            return;
        }
        let mut state = self.state.lock();
        if state.tracked[frame_id.index()] {
            return;
        }
        state.tracked[frame_id.index()] = true;
        state.queue.push_back(frame_id);
    }

    fn size(&self) -> usize {
        self.state.lock().queue.len()
    }
}
