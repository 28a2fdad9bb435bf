//! Error types for the server binary.
//!
//! [`ServerError`] covers startup and the console loop. Admission and save
//! failures never reach it; the hooks log those and carry on.

/// Top-level error for the server binary.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tribal_core::config::ConfigError,
    },

    /// The configured starting world is unusable.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: tribal_world::WorldError,
    },

    /// Reading host events or writing replies failed.
    #[error("console I/O error: {source}")]
    Console {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
