//! Frame callback that reports animation progress to the log.
//!
//! The frame loop runs at tens of frames per wall second, so per-frame
//! output stays at `trace`; a periodic `info` line keeps long headless
//! runs observable without drowning the log.

use radwave_core::frame::{AnimationState, FrameSummary};
use radwave_core::runner::FrameCallback;
use tracing::{info, trace};

/// Callback that logs a summary line every N frames.
pub struct SummaryCallback {
    /// Report cadence in frames.
    every: u64,
}

impl SummaryCallback {
    /// Create a callback reporting every `every` frames (minimum 1).
    pub const fn new(every: u64) -> Self {
        Self {
            every: if every == 0 { 1 } else { every },
        }
    }
}

impl FrameCallback for SummaryCallback {
    fn on_frame(&mut self, summary: &FrameSummary, _state: &AnimationState) {
        trace!(
            frame = summary.frame,
            clock = %summary.clock,
            phase = summary.phase,
            "frame"
        );
        if summary.frame.checked_rem(self.every) == Some(0) {
            info!(
                frame = summary.frame,
                clock = %summary.clock,
                phase = summary.phase,
                points = summary.annotation_points,
                visible_rows = summary.visible_rows,
                reset = summary.clock_reset,
                "animation progress"
            );
        }
    }
}
