//! services/app/src/error.rs
//!
//! Defines the primary error type for the app service.

use crate::config::ConfigError;
use foodshare_core::ports::PortError;

/// The primary error type for the `app` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports,
    /// such as a rejected startup sign-in.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the backend HTTP client.
    #[error("HTTP Error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., waiting on a signal).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store was requested after its provider was torn down.
    #[error("Configuration error: store used outside of its provider")]
    OutsideProvider,
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
