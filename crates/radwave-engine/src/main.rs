//! Animation driver binary for the Radcliffe Wave visualization.
//!
//! This is the main entry point that wires together the headless engine
//! session, dataset loading, layer setup, and the clock-phase frame
//! loop. It loads configuration, initializes all subsystems, and runs
//! the animation until a termination condition is met (none, by
//! default: the production animation cycles until the process stops).
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `radwave-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the time window from the configured bounds
//! 4. Create the headless session (clock at window start, configured rate)
//! 5. Point the camera and apply scene settings
//! 6. Load the four dataset files (concurrent, awaited, fatal on failure)
//! 7. Create and configure the layers; extract the best-fit rows
//! 8. Assemble the driver state and run controls
//! 9. Run the animation loop
//! 10. Log the result

mod callback;
mod error;
mod fetch;
mod session;
mod setup;

use std::path::Path;
use std::sync::Arc;

use radwave_core::annotation::PolylineAnnotation;
use radwave_core::config::VisualizationConfig;
use radwave_core::engine::CameraHost as _;
use radwave_core::frame::AnimationState;
use radwave_core::runner::{self, RunControls};
use radwave_types::DatasetKind;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::callback::SummaryCallback;
use crate::error::DriverError;
use crate::session::HeadlessSession;

/// Frames between progress log lines (about once per wall second at the
/// default frame interval).
const PROGRESS_EVERY_FRAMES: u64 = 60;

/// Application entry point for the animation driver.
///
/// Initializes all subsystems and runs the frame loop. Returns an error
/// code on failure.
///
/// # Errors
///
/// Returns an error if any initialization step or the animation itself fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging. The environment filter wins when
    //    set; the configured level is the fallback.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("radwave-engine starting");
    info!(
        window_start = %config.time.start,
        window_end = %config.time.end,
        rate_seconds_per_second = config.time.rate_seconds_per_second,
        frame_interval_ms = config.frame.interval_ms,
        "configuration loaded"
    );

    // 3. Build the time window.
    let window = config.window().map_err(DriverError::from)?;

    // 4. Create the headless session with the clock at the window start.
    let mut session = HeadlessSession::new(window.start(), config.time.rate_seconds_per_second);
    info!("engine session initialized");

    // 5. Point the camera and apply the scene settings.
    session.set_imagery(&config.scene.background_imagery, &config.scene.foreground_imagery);
    session.apply_scene_settings(&config.scene.engine_settings());
    session.goto_ra_dec_zoom(
        config.camera.ra_hours,
        config.camera.dec_degrees,
        config.camera.zoom,
        config.camera.instant,
    );
    info!(
        ra_hours = config.camera.ra_hours,
        dec_degrees = config.camera.dec_degrees,
        zoom = config.camera.zoom,
        "camera positioned"
    );

    // 6. Load the datasets. The frame loop must not start until every
    //    load has resolved; a failure here aborts startup.
    let texts = fetch::load_dataset_texts(&config.data).await?;

    // 7. Create and configure the layers.
    let specs = config.dataset_specs().map_err(DriverError::from)?;
    let layer_setup = setup::setup_layers(&mut session, &specs, &texts)?;
    info!(
        time_series_layers = layer_setup.time_series_layers.len(),
        best_fit_layer = %layer_setup.best_fit_layer,
        best_fit_rows = layer_setup.best_fit_rows.len(),
        "layers configured"
    );

    // 8. Assemble the driver state and run controls.
    let best_fit_style = config.layers.style_for(DatasetKind::BestFit);
    let annotation_color = radwave_types::Color::from_hex(&best_fit_style.color)
        .unwrap_or(radwave_types::Color::rgb(0x83, 0xbe, 0xfb));
    let mut state = AnimationState::new(
        window,
        layer_setup.best_fit_rows,
        PolylineAnnotation::new(DatasetKind::BestFit.layer_name(), annotation_color),
        layer_setup.time_series_layers,
    );

    let controls = Arc::new(RunControls::new(&config.frame));

    // Stop cleanly on Ctrl-C.
    let stop_controls = Arc::clone(&controls);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after current frame");
            stop_controls.request_stop();
        } else {
            warn!("failed to install interrupt handler");
        }
    });

    let mut frame_callback = SummaryCallback::new(PROGRESS_EVERY_FRAMES);

    info!("driver state assembled, entering frame loop");

    // 9. Run the animation.
    let result = runner::run_animation(&mut state, &mut session, &controls, &mut frame_callback)
        .await
        .map_err(DriverError::from)?;

    // 10. Log results.
    runner::log_animation_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_frames = result.total_frames,
        "radwave-engine shutdown complete"
    );

    Ok(())
}

/// Load the driver configuration from `radwave-config.yaml`.
///
/// Looks for the config file relative to the current working directory;
/// when it is absent, the built-in production defaults are used.
fn load_config() -> Result<VisualizationConfig, DriverError> {
    let config_path = Path::new("radwave-config.yaml");
    if config_path.exists() {
        let config = VisualizationConfig::from_file(config_path)?;
        Ok(config)
    } else {
        let mut config = VisualizationConfig::default();
        config.data.apply_env_overrides();
        Ok(config)
    }
}
