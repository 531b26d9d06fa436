//! Numeric helpers shared by the fitting and peak-estimation modules.

pub mod ols;
pub mod stats;

pub use ols::{linear_fit, BandPoint, LinearFit};
pub use stats::{mean, sample_quantile};
