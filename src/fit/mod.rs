//! Log-linear growth models for epidemic curves.
//!
//! The model is ordinary least squares of `ln(count)` on time in days:
//! the slope is the daily exponential growth rate, and `ln(2) / |rate|`
//! gives the doubling time (growth) or halving time (decay). Bins with a
//! zero count are excluded from the regression but still predicted, so the
//! fitted curve and its confidence band cover the whole fitted range.

mod fitter;
mod model;

pub use fitter::{fit, fit_grouped, fit_grouped_range, fit_range, GroupedFit};
pub use model::{BinPrediction, FitConfig, FittedModel, GrowthRegime};
