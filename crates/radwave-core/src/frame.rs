//! The per-frame update cycle of the clock-phase driver.
//!
//! Each rendered frame runs through the same sequence:
//!
//! 1. **Read** -- sample the engine's simulation clock.
//! 2. **Reset** -- if the clock has reached the window end, snap it back
//!    to the window start. The reset is instantaneous; the same frame
//!    continues with the reset clock value.
//! 3. **Phase** -- derive the oscillation phase from elapsed whole days.
//! 4. **Annotation** -- rebuild the best-fit polyline from the rows
//!    matching the phase and swap it into the scene.
//! 5. **Summarize** -- report the frame to the caller for logging and
//!    callbacks.
//!
//! The cycle is deterministic given the same clock value and rows.

use chrono::{DateTime, Utc};
use radwave_types::{DataRow, LayerId};
use tracing::{debug, info};

use crate::annotation::{self, PolylineAnnotation};
use crate::clock::TimeWindow;
use crate::engine::{EngineError, VisualizationEngine};

/// Errors that can occur during frame execution.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An engine operation failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },
}

/// The mutable driver state threaded through the frame cycle.
///
/// Assembled once at startup, after every dataset load has resolved;
/// the frame loop never touches unloaded data.
#[derive(Debug)]
pub struct AnimationState {
    /// The repeat interval the clock cycles through.
    pub window: TimeWindow,
    /// Typed rows of the best-fit dataset, in file order.
    pub best_fit_rows: Vec<DataRow>,
    /// The driver-owned polyline annotation.
    pub annotation: PolylineAnnotation,
    /// Time-series layers, for visibility reporting.
    pub time_series_layers: Vec<LayerId>,
    /// Frames rendered so far (0 before the first frame).
    pub frames_rendered: u64,
}

impl AnimationState {
    /// Assemble the driver state from setup results.
    pub const fn new(
        window: TimeWindow,
        best_fit_rows: Vec<DataRow>,
        annotation: PolylineAnnotation,
        time_series_layers: Vec<LayerId>,
    ) -> Self {
        Self {
            window,
            best_fit_rows,
            annotation,
            time_series_layers,
            frames_rendered: 0,
        }
    }
}

/// Summary of a single frame's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummary {
    /// The frame number that was executed (1-based).
    pub frame: u64,
    /// The simulated clock value the frame ran with (post-reset).
    pub clock: DateTime<Utc>,
    /// The oscillation phase the frame rendered.
    pub phase: u32,
    /// Whether this frame snapped the clock back to the window start.
    pub clock_reset: bool,
    /// Number of points in the refreshed best-fit annotation.
    pub annotation_points: usize,
    /// Total rows of the time-series layers visible at `clock`.
    pub visible_rows: usize,
}

/// Execute one frame of the animation cycle.
///
/// # Errors
///
/// Returns [`FrameError`] if an engine operation fails; the clock reset
/// and phase derivation themselves cannot fail.
pub fn run_frame<E>(state: &mut AnimationState, engine: &mut E) -> Result<FrameSummary, FrameError>
where
    E: VisualizationEngine + ?Sized,
{
    // 1-2. Read the clock, reset if the window has elapsed.
    let mut now = engine.now();
    let clock_reset = state.window.is_expired(now);
    if clock_reset {
        info!(expired_at = %now, restart = %state.window.start(), "cycle complete, clock reset");
        engine.set_now(state.window.start());
        now = state.window.start();
    }

    // 3. Derive the phase from the (possibly reset) clock.
    let phase = state.window.phase_at(now);

    // 4. Rebuild the best-fit annotation for this phase.
    let annotation_points =
        annotation::refresh_annotation(&mut state.annotation, phase, &state.best_fit_rows, engine)?;

    // 5. Summarize.
    let visible_rows = state
        .time_series_layers
        .iter()
        .try_fold(0_usize, |total, layer| {
            engine
                .visible_row_count(*layer, now)
                .map(|count| total.saturating_add(count))
        })?;

    state.frames_rendered = state.frames_rendered.saturating_add(1);
    let summary = FrameSummary {
        frame: state.frames_rendered,
        clock: now,
        phase,
        clock_reset,
        annotation_points,
        visible_rows,
    };
    debug!(
        frame = summary.frame,
        clock = %summary.clock,
        phase = summary.phase,
        points = summary.annotation_points,
        visible_rows = summary.visible_rows,
        "frame complete"
    );
    Ok(summary)
}
