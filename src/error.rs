//! Error types for the epicurve library.

use thiserror::Error;

/// Result type alias for epicurve operations.
pub type Result<T> = std::result::Result<T, EpicurveError>;

/// Errors that can occur while binning, slicing, or fitting incidence data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EpicurveError {
    /// Malformed caller input: empty data, a non-positive interval, a
    /// mismatched group sequence, or an out-of-range selection.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Too few bins with positive counts to fit a regression.
    #[error("insufficient data: need at least {needed} bins with positive counts, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Numerically degenerate regression (e.g. zero predictor variance).
    #[error("model fit failed: {0}")]
    ModelFitFailure(String),

    /// The split search exhausted every candidate without a viable pair of fits.
    #[error("no valid split: {0}")]
    NoValidSplit(String),
}
