//! Error types for atomview-rs.

use thiserror::Error;

/// The main error type for atomview-rs operations.
#[derive(Error, Debug)]
pub enum AtomViewError {
    /// Quantum numbers outside `n >= 1`, `0 <= l < n`, `-l <= m <= l`.
    #[error("invalid quantum state (n={n}, l={l}, m={m}): require n >= 1, 0 <= l < n, -l <= m <= l")]
    InvalidQuantumState { n: u32, l: u32, m: i32 },

    /// The sampling grid cannot be built with this many points per axis.
    #[error("invalid sample grid: {num_pts} points per axis (need at least 2)")]
    InvalidGrid { num_pts: u32 },

    /// Maximum opacity outside `[0, 1]`.
    #[error("max opacity {0} is outside [0, 1]")]
    InvalidOpacity(f32),

    /// A build option is out of its documented range.
    #[error("invalid build options: {0}")]
    InvalidOptions(String),

    /// A non-finite value was produced while evaluating the wavefunction.
    #[error("numeric instability in {context}: {detail}")]
    NumericInstability {
        context: &'static str,
        detail: String,
    },

    /// The isosurface has no geometry at the chosen isovalue.
    #[error("empty contour: isovalue {isovalue:e} does not cross the sampled density (max {max_density:e})")]
    EmptyContour { isovalue: f32, max_density: f32 },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AtomViewError {
    /// Returns true for failures a host can recover from by keeping its previous frame.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NumericInstability { .. } | Self::EmptyContour { .. }
        )
    }
}

/// A specialized Result type for atomview-rs operations.
pub type Result<T> = std::result::Result<T, AtomViewError>;
