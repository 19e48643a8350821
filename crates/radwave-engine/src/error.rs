//! Error types for the animation driver binary.
//!
//! [`DriverError`] is the top-level error type that wraps all possible
//! failure modes during startup and animation execution.

/// Top-level error for the animation driver binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: radwave_core::config::ConfigError,
    },

    /// Time window construction failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: radwave_core::clock::ClockError,
    },

    /// An engine session operation failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: radwave_core::engine::EngineError,
    },

    /// The animation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: radwave_core::runner::RunnerError,
    },

    /// A dataset file could not be read. Fatal: the driver never starts
    /// without its data.
    #[error("failed to load dataset {path}: {source}")]
    Data {
        /// Path of the file that failed to load.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Layer setup produced an inconsistent result.
    #[error("setup error: {message}")]
    Setup {
        /// Description of the setup failure.
        message: String,
    },
}
