//! CLOCK (second-chance) replacement policy.
//!
//! Tracked frames sit on a circular list in the order they became eligible.
//! Each carries a reference bit that is set when the frame is first tracked.
//! The clock hand sweeps the circle: a frame with its bit set loses the bit
//! and is skipped, the first frame found with the bit clear is the victim.
//!
//! Unpinning a frame that is already tracked does NOT set its bit again.
//! The bit is only granted on the transition into the tracked set.

use parking_lot::RwLock;

use crate::buffer::replacer::Replacer;
use crate::common::FrameId;

/// One arena slot per frame. Links form the circular order of tracked frames.
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    tracked: bool,
    reference: bool,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
struct ClockState {
    slots: Vec<Slot>,
    head: Option<usize>,
    tail: Option<usize>,
    /// Next frame to examine. `None` iff nothing is tracked.
    hand: Option<usize>,
    len: usize,
}

impl ClockState {
    fn new(num_frames: usize) -> Self {
        Self {
            slots: vec![Slot::default(); num_frames],
            head: None,
            tail: None,
            hand: None,
            len: 0,
        }
    }

    fn push_back(&mut self, idx: usize) {
        self.slots[idx] = Slot {
            tracked: true,
            reference: true,
            prev: self.tail,
            next: None,
        };
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;

        if self.len == 1 {
            self.hand = Some(idx);
        }
    }

    /// Move the hand one step, wrapping from the tail to the head.
    fn advance(&mut self) {
        if let Some(hand) = self.hand {
            self.hand = self.slots[hand].next.or(self.head);
        }
    }

    fn remove(&mut self, idx: usize) -> bool {
        if !self.slots[idx].tracked {
            return false;
        }

        if self.hand == Some(idx) {
            self.advance();
        }

        let Slot { prev, next, .. } = self.slots[idx];
        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx] = Slot::default();
        self.len -= 1;

        if self.len == 0 {
            self.hand = None;
        }
        true
    }

    fn victim(&mut self) -> Option<usize> {
        let mut hand = self.hand?;

        // Terminates within two laps: the first lap clears every bit.
        while self.slots[hand].reference {
            self.slots[hand].reference = false;
            self.advance();
            hand = self.hand?;
        }

        self.remove(hand);
        Some(hand)
    }
}

/// Clock-sweep replacer approximating LRU.
///
/// # Thread Safety
/// One `RwLock` guards the circle and the hand. `pin`, `unpin` and `victim`
/// take it exclusively; `size` takes it shared.
///
/// # Example
/// ```
/// use clockpool::{ClockReplacer, FrameId, Replacer};
///
/// let replacer = ClockReplacer::new(3);
/// replacer.unpin(FrameId::new(0));
/// replacer.unpin(FrameId::new(1));
///
/// // Both frames lose their reference bit on the first lap.
/// assert_eq!(replacer.victim(), Some(FrameId::new(0)));
/// ```
#[derive(Debug)]
pub struct ClockReplacer {
    state: RwLock<ClockState>,
    num_frames: usize,
}

impl ClockReplacer {
    /// Create a replacer for frames `0..num_frames`.
    pub fn new(num_frames: usize) -> Self {
        Self {
            state: RwLock::new(ClockState::new(num_frames)),
            num_frames,
        }
    }

    fn in_range(&self, frame_id: FrameId) -> bool {
        if frame_id.index() < self.num_frames {
            return true;
        }
        log::warn!(
            "clock replacer ignoring {} (tracks {} frames)",
            frame_id,
            self.num_frames
        );
        false
    }
}

impl Replacer for ClockReplacer {
    fn victim(&self) -> Option<FrameId> {
        let victim = self.state.write().victim().map(FrameId::new);
        if let Some(frame_id) = victim {
            log::trace!("clock victim {}", frame_id);
        }
        victim
    }

    fn pin(&self, frame_id: FrameId) {
        if !self.in_range(frame_id) {
            return;
        }
        if self.state.write().remove(frame_id.index()) {
            log::trace!("clock untracked {}", frame_id);
        }
    }

    fn unpin(&self, frame_id: FrameId) {
        if !self.in_range(frame_id) {
            return;
        }
        let mut state = self.state.write();
        if state.slots[frame_id.index()].tracked {
            return;
        }
        state.push_back(frame_id.index());
        log::trace!("clock tracking {}", frame_id);
    }

    fn size(&self) -> usize {
        self.state.read().len
    }
}
