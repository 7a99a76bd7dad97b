//! # Error Types
//!
//! This module defines the crate-level error type. Roster and export
//! failures have their own enums next to the code that raises them
//! ([`crate::roster::RosterError`], [`crate::export::ExportError`]).

use thiserror::Error;

/// Main error type for carnet operations
#[derive(Debug, Error)]
pub enum CarnetError {
    /// A color string that is neither hex nor a known name
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Structurally invalid card design (duplicate ids, bad geometry)
    #[error("Invalid design: {0}")]
    InvalidDesign(String),

    /// Edit addressed an element id that is not in the design
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    /// Image decoding, encoding or loading error
    #[error("Image error: {0}")]
    Image(String),

    /// QR code could not be encoded
    #[error("QR error: {0}")]
    Qr(String),

    /// Invalid configuration (CLI flags, environment)
    #[error("Config error: {0}")]
    Config(String),

    /// JSON (de)serialization of designs and rosters
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
