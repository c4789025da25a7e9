//! Eviction policy implementations (replacers).
//!
//! A replacer tracks the frames whose pin count is zero and picks which one
//! to reclaim when the free list is empty.
//!
//! Implementations:
//! - [`ClockReplacer`] - Second-chance clock sweep (default)
//! - [`FifoReplacer`] - Oldest-eligible-first

mod clock;
mod fifo;

pub use clock::ClockReplacer;
pub use fifo::FifoReplacer;

use crate::common::FrameId;

/// Eviction policy over a fixed universe of frame ids `0..num_frames`.
///
/// Every method takes `&self`; implementations lock internally and must be
/// safe to call from many threads.
pub trait Replacer: Send + Sync {
    /// Select one eligible frame, stop tracking it and return it.
    ///
    /// Returns `None` if no frame is tracked.
    fn victim(&self) -> Option<FrameId>;

    /// Remove `frame_id` from eligibility. No-op if not tracked.
    fn pin(&self, frame_id: FrameId);

    /// Make `frame_id` eligible for eviction. No-op if already tracked.
    fn unpin(&self, frame_id: FrameId);

    /// Number of tracked (eligible) frames.
    fn size(&self) -> usize;
}

/// Selects the eviction policy when building a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacerKind {
    #[default]
    Clock,
    Fifo,
}

impl ReplacerKind {
    /// Build a replacer for `num_frames` frames.
    pub fn build(self, num_frames: usize) -> Box<dyn Replacer> {
        match self {
            ReplacerKind::Clock => Box::new(ClockReplacer::new(num_frames)),
            ReplacerKind::Fifo => Box::new(FifoReplacer::new(num_frames)),
        }
    }
}
