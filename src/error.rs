//! Error types surfaced by the meter.
//!
//! Rendering itself never fails: a progress display must not abort the work it
//! decorates, so write failures on the render path are logged and swallowed. Only
//! construction-time misconfiguration and the explicit [`write`](crate::ProgressMeter::write)
//! utilities return errors.

use thiserror::Error;

/// Errors returned by meter construction and the explicit message utilities.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// The target render rate was zero, negative or not a finite number.
    #[error("target render rate must be a positive finite number, got {rate}")]
    InvalidRate {
        /// The rejected rate, in renders per second.
        rate: f64,
    },

    /// The fixed terminal width was zero or wider than a terminal can report.
    #[error("terminal width must be between 1 and {max} columns, got {columns}")]
    InvalidColumns {
        /// The rejected width.
        columns: usize,
        /// The widest accepted width.
        max: usize,
    },

    /// Writing a message to the status stream failed.
    #[error("failed to write to the status stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results produced by this crate.
pub type Result<T, E = ProgressError> = std::result::Result<T, E>;
