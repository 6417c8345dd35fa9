//! Error types for the Skytrace engine
//!
//! Every failure is fatal: the engine never retries or degrades. The variants
//! only tell the caller which phase broke.

use std::fmt;

/// Result type for Skytrace engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Skytrace engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Startup failed (no suitable device, missing layer, object creation)
    InitializationFailed(String),

    /// Resource creation or upload failed (memory type lookup, staging, decoding)
    ResourceFailed(String),

    /// Steady-state frame failed (submit, acquire, present)
    FrameFailed(String),
}

impl Error {
    /// Message carried by the error, without the phase prefix
    pub fn message(&self) -> &str {
        match self {
            Error::InitializationFailed(msg)
            | Error::ResourceFailed(msg)
            | Error::FrameFailed(msg) => msg,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ResourceFailed(msg) => write!(f, "Resource failure: {}", msg),
            Error::FrameFailed(msg) => write!(f, "Frame failure: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
