//! Error types for the dynamics engine.

use thiserror::Error;

use crate::sim::TrackId;

/// Errors surfaced by body construction, track queries and settings loading.
///
/// Conservation violations are not errors; they are reported through
/// [`StepOutcome`](crate::sim::StepOutcome).
#[derive(Debug, Error)]
pub enum DynamicsError {
    /// Mass must be finite and strictly positive.
    #[error("invalid mass: {0} (must be finite and > 0)")]
    InvalidMass(f64),

    /// A track with zero or non-finite length reached the traversal query.
    #[error("degenerate track {id}: length {length}")]
    DegenerateTrack {
        /// Identity of the offending track.
        id: TrackId,
        /// Reported length.
        length: f64,
    },

    /// A settings value is out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings JSON could not be parsed.
    #[error("settings parse error: {0}")]
    SettingsParse(#[from] serde_json::Error),

    /// Settings file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for dynamics operations.
pub type Result<T> = std::result::Result<T, DynamicsError>;
