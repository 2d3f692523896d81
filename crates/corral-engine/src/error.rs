//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the tick loop.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: corral_core::ConfigError,
    },

    /// The world refused an operation.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: corral_world::WorldError,
    },

    /// Dispatcher setup failed.
    #[error("dispatch error: {source}")]
    Dispatch {
        /// The underlying dispatch error.
        #[from]
        source: corral_core::DispatchError,
    },

    /// The demo section of the config could not be read.
    #[error("demo config error: {message}")]
    Demo {
        /// Description of the failure.
        message: String,
    },
}
