//! Animation loop runner with runtime controls.
//!
//! This module provides [`run_animation`], the top-level async function
//! that drives the frame cycle with support for:
//!
//! - **Unbounded playback**: the production default, cycling indefinitely
//! - **Bounded runs**: stop after `max_frames` or `max_real_time_seconds`
//! - **Pause/resume**: freeze the frame loop without tearing it down
//! - **Variable frame interval**: adjustable at runtime
//! - **Clean stop**: a stop request ends the loop after the current frame
//!
//! The runner wraps the single-frame [`run_frame`] function and adds the
//! control plane around it. It must only be started once setup (dataset
//! loads, layer configuration) has fully resolved; it never initiates
//! loads itself.
//!
//! [`run_frame`]: crate::frame::run_frame

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::config::FrameConfig;
use crate::engine::VisualizationEngine;
use crate::frame::{self, AnimationState, FrameError, FrameSummary};

/// Errors that can occur during the animation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A frame execution failed.
    #[error("frame error: {source}")]
    Frame {
        /// The underlying frame error.
        #[from]
        source: FrameError,
    },
}

/// Reason why the animation loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationEndReason {
    /// Reached the configured `max_frames` limit.
    MaxFramesReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// A stop was requested through [`RunControls`].
    Stopped,
}

/// Result of the animation run.
#[derive(Debug)]
pub struct AnimationResult {
    /// The reason the loop ended.
    pub end_reason: AnimationEndReason,
    /// The last frame summary, if any frame completed.
    pub final_summary: Option<FrameSummary>,
    /// Total number of frames executed.
    pub total_frames: u64,
}

/// Callback invoked after each frame completes.
///
/// Implementations can use this to log summaries, feed dashboards, or
/// record traces. The callback receives the frame summary and the
/// current driver state.
pub trait FrameCallback: Send {
    /// Called after a frame completes successfully.
    fn on_frame(&mut self, summary: &FrameSummary, state: &AnimationState);
}

/// A no-op frame callback for testing.
pub struct NoOpCallback;

impl FrameCallback for NoOpCallback {
    fn on_frame(&mut self, _summary: &FrameSummary, _state: &AnimationState) {}
}

/// Shared runtime control state for the animation loop.
///
/// Wrapped in [`Arc`] and shared between the frame loop and whatever
/// controls it (signal handlers, a test harness). Atomic fields keep
/// the frame-loop hot path lock-free.
#[derive(Debug)]
pub struct RunControls {
    /// Whether playback is currently paused.
    paused: AtomicBool,

    /// Notification used to wake the frame loop when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Current frame interval in milliseconds (runtime-adjustable).
    frame_interval_ms: AtomicU64,

    /// Wall-clock time when the run started.
    started_at: DateTime<Utc>,

    /// Maximum number of frames (0 = unlimited).
    max_frames: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    max_real_time_seconds: u64,
}

impl RunControls {
    /// Create run controls from the frame configuration.
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            frame_interval_ms: AtomicU64::new(config.interval_ms),
            started_at: Utc::now(),
            max_frames: config.max_frames,
            max_real_time_seconds: config.max_real_time_seconds,
        }
    }

    /// Check whether playback is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause playback. The frame loop will sleep until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume playback and wake the frame loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until playback is no longer paused.
    ///
    /// Returns immediately if not paused. Otherwise blocks until
    /// [`resume`](Self::resume) is called.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    /// Request a clean stop after the current frame.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Current frame interval in milliseconds.
    pub fn frame_interval_ms(&self) -> u64 {
        self.frame_interval_ms.load(Ordering::Acquire)
    }

    /// Change the frame interval. Returns the previous value, or `None`
    /// when the requested interval is rejected (zero is reserved for
    /// configs that want back-to-back frames and cannot be set at
    /// runtime).
    pub fn set_frame_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms == 0 {
            return None;
        }
        Some(self.frame_interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Whether the frame limit has been reached.
    pub const fn frame_limit_reached(&self, frames_completed: u64) -> bool {
        self.max_frames > 0 && frames_completed >= self.max_frames
    }

    /// Whether the wall-clock limit has been reached.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Wall-clock time when the run started.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole wall-clock seconds since the run started.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        u64::try_from(elapsed.num_seconds()).unwrap_or(0)
    }

    /// Configured frame limit (0 = unlimited).
    pub const fn max_frames(&self) -> u64 {
        self.max_frames
    }

    /// Configured wall-clock limit in seconds (0 = unlimited).
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }
}

/// Run the animation loop until a termination condition is met.
///
/// This is the main entry point after setup. It integrates the frame
/// cycle with the runtime controls (pause, resume, interval, stop) and
/// the optional bounds (max frames, max wall-clock time). With both
/// bounds at 0 and no stop request, the loop runs indefinitely -- the
/// production configuration.
///
/// # Arguments
///
/// * `state` - Mutable driver state (window, rows, annotation)
/// * `engine` - The engine session (clock, layers, projection, scene)
/// * `controls` - Shared runtime control state
/// * `callback` - Called after each frame
///
/// # Errors
///
/// Returns [`RunnerError`] if a frame execution fails unrecoverably.
pub async fn run_animation(
    state: &mut AnimationState,
    engine: &mut dyn VisualizationEngine,
    controls: &Arc<RunControls>,
    callback: &mut dyn FrameCallback,
) -> Result<AnimationResult, RunnerError> {
    let mut last_summary: Option<FrameSummary> = None;
    let mut total_frames: u64 = 0;

    info!(
        max_frames = controls.max_frames(),
        max_real_time_seconds = controls.max_real_time_seconds(),
        frame_interval_ms = controls.frame_interval_ms(),
        "animation starting"
    );

    loop {
        // --- Check pause ---
        if controls.is_paused() {
            info!("playback paused, waiting for resume...");
            controls.wait_if_paused().await;
            info!("playback resumed");
        }

        // --- Check stop request (before frame) ---
        if controls.is_stop_requested() {
            info!("stop requested");
            return Ok(AnimationResult {
                end_reason: AnimationEndReason::Stopped,
                final_summary: last_summary,
                total_frames,
            });
        }

        // --- Check wall-clock limit (before frame) ---
        if controls.time_limit_reached() {
            info!(
                max_seconds = controls.max_real_time_seconds(),
                elapsed = controls.elapsed_seconds(),
                "wall-clock limit reached"
            );
            return Ok(AnimationResult {
                end_reason: AnimationEndReason::MaxRealTimeReached,
                final_summary: last_summary,
                total_frames,
            });
        }

        // --- Execute frame ---
        let summary = frame::run_frame(state, engine)?;

        total_frames = total_frames.saturating_add(1);

        // --- Notify callback ---
        callback.on_frame(&summary, state);

        // --- Check frame limit (after frame) ---
        if controls.frame_limit_reached(total_frames) {
            info!(
                frames = total_frames,
                max_frames = controls.max_frames(),
                "frame limit reached"
            );
            return Ok(AnimationResult {
                end_reason: AnimationEndReason::MaxFramesReached,
                final_summary: Some(summary),
                total_frames,
            });
        }

        last_summary = Some(summary);

        // --- Sleep for frame interval ---
        let interval_ms = controls.frame_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

/// Log the end-of-run sequence.
///
/// Called after [`run_animation`] returns to record the final state.
pub fn log_animation_end(result: &AnimationResult) {
    info!(
        reason = ?result.end_reason,
        total_frames = result.total_frames,
        final_phase = result.final_summary.as_ref().map(|s| s.phase),
        final_clock = result.final_summary.as_ref().map(|s| s.clock.to_rfc3339()),
        "animation ended"
    );

    if result.final_summary.is_none() {
        warn!("animation ended with no frames executed");
    }
}
