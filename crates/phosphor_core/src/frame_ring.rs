//! Frame history ring and decay schedule
//!
//! Each render commits the current frame into the next slot of a fixed ring.
//! Slots are drawn oldest first; a slot written `age` renders ago is drawn at
//! [`opacity_for_age`].

use crate::config::MAX_DECAY_STEPS;
use crate::error::{DisplayError, Result};

/// Opacity of a frame `age` renders old
///
/// Age 0 is the frame just committed and is always fully opaque. Age 1 drops
/// to `initial_decay`, and every further frame multiplies by `decay`.
pub fn opacity_for_age(age: usize, decay: f64, initial_decay: f64) -> f64 {
    match age {
        0 => 1.0,
        _ => decay.powi((age - 1) as i32) * initial_decay,
    }
}

/// One slot to draw, with its decayed opacity
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotDraw {
    /// Ring slot index (also the GPU vertex buffer index)
    pub slot: usize,
    /// Renders since the slot was written
    pub age: usize,
    pub opacity: f64,
    pub vertex_count: usize,
}

/// Ring of per-frame vertex counts
///
/// `steps == 0` keeps a single slot that is overwritten every render and
/// never ages, so only the current frame is visible.
#[derive(Clone, Debug)]
pub struct FrameRing {
    steps: usize,
    step: usize,
    counts: Vec<usize>,
}

impl FrameRing {
    /// Create an empty ring with `steps` history slots
    pub fn new(steps: usize) -> Result<Self> {
        if steps > MAX_DECAY_STEPS {
            return Err(DisplayError::InvalidSteps(steps));
        }
        Ok(Self {
            steps,
            step: 0,
            counts: vec![0; steps.max(1)],
        })
    }

    /// Configured number of decay steps
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of physical slots (at least one)
    pub fn slot_count(&self) -> usize {
        self.counts.len()
    }

    /// Slot written by the most recent [`advance`](Self::advance)
    pub fn current_slot(&self) -> usize {
        self.step
    }

    /// Vertex count stored in `slot`
    pub fn vertex_count(&self, slot: usize) -> usize {
        self.counts.get(slot).copied().unwrap_or(0)
    }

    /// True when no slot holds geometry
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&n| n == 0)
    }

    /// Move to the next slot and record the frame written into it
    ///
    /// Returns the slot index the caller must upload the frame to.
    pub fn advance(&mut self, vertex_count: usize) -> usize {
        self.step = (self.step + 1) % self.counts.len();
        self.counts[self.step] = vertex_count;
        self.step
    }

    /// Non-empty slots ordered oldest to newest
    pub fn draw_order(&self, decay: f64, initial_decay: f64) -> Vec<SlotDraw> {
        let slots = self.counts.len();
        (0..slots)
            .rev()
            .filter_map(|age| {
                let slot = (self.step + slots - age) % slots;
                let vertex_count = self.counts[slot];
                (vertex_count > 0).then(|| SlotDraw {
                    slot,
                    age,
                    opacity: opacity_for_age(age, decay, initial_decay),
                    vertex_count,
                })
            })
            .collect()
    }

    /// Forget every stored frame
    pub fn reset(&mut self) {
        self.step = 0;
        self.counts.iter_mut().for_each(|n| *n = 0);
    }
}
