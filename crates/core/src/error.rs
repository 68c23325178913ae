//! Error types for U-CutStock.

use thiserror::Error;

/// Result type alias for U-CutStock operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during cutting-stock optimization.
#[derive(Debug, Error)]
pub enum Error {
    /// A piece catalog entry failed validation.
    #[error("Invalid piece: {0}")]
    InvalidPiece(String),

    /// A stock catalog entry failed validation.
    #[error("Invalid stock block: {0}")]
    InvalidStock(String),

    /// The run cannot be configured (e.g. no stock to cut from).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Computation cancelled.
    #[error("Computation cancelled")]
    Cancelled,

    /// Serialization error.
    #[cfg(feature = "serde")]
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if this error was raised while validating catalog input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidPiece(_) | Error::InvalidStock(_))
    }
}
