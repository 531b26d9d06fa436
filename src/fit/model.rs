//! Fitted growth models and their configuration.

use crate::error::{EpicurveError, Result};
use crate::utils::LinearFit;
use chrono::{Duration, NaiveDate};
use std::ops::Range;

/// Configuration for growth-model fitting.
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Confidence level for the rate interval and the per-bin band,
    /// strictly between 0 and 1.
    pub confidence: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self { confidence: 0.95 }
    }
}

impl FitConfig {
    /// 95% confidence level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence level.
    pub fn with_confidence(mut self, level: f64) -> Self {
        self.confidence = level;
        self
    }
}

/// Which exponential regime a fitted model is in, with its characteristic
/// time in days.
///
/// Exactly one of doubling or halving time is reported, matching the sign
/// of the fitted rate. A rate of exactly zero is reported as growth with an
/// infinite doubling time. Interval bounds are infinite where the rate
/// interval crosses zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrowthRegime {
    /// Non-negative rate: counts double every `doubling_days`.
    Growth {
        /// `ln(2) / rate`.
        doubling_days: f64,
        /// Doubling time implied by the rate interval (lower, upper).
        doubling_interval: (f64, f64),
    },
    /// Negative rate: counts halve every `halving_days`.
    Decay {
        /// `ln(2) / |rate|`.
        halving_days: f64,
        /// Halving time implied by the rate interval (lower, upper).
        halving_interval: (f64, f64),
    },
}

impl GrowthRegime {
    /// True for the growth regime.
    pub fn is_growth(&self) -> bool {
        matches!(self, GrowthRegime::Growth { .. })
    }

    /// Derive the regime from a fitted rate and its confidence interval,
    /// both in per-day units.
    pub(crate) fn from_rate(rate: f64, rate_interval: (f64, f64)) -> Self {
        let ln2 = std::f64::consts::LN_2;
        if rate >= 0.0 {
            // Doubling time shrinks as the rate grows, so the interval
            // bounds swap sides; a bound at or below zero never doubles.
            let doubling = |r: f64| if r > 0.0 { ln2 / r } else { f64::INFINITY };
            GrowthRegime::Growth {
                doubling_days: doubling(rate),
                doubling_interval: (doubling(rate_interval.1), doubling(rate_interval.0)),
            }
        } else {
            let halving = |r: f64| if r < 0.0 { -ln2 / r } else { f64::INFINITY };
            GrowthRegime::Decay {
                halving_days: halving(rate),
                halving_interval: (halving(rate_interval.0), halving(rate_interval.1)),
            }
        }
    }
}

/// Model output for one time bin, in count space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinPrediction {
    /// Bin index in the fitted series' numbering; projections continue the
    /// numbering past the last bin.
    pub bin: usize,
    /// Bin start date.
    pub date: NaiveDate,
    /// Observed count; `None` for projected bins.
    pub observed: Option<u64>,
    /// Fitted count.
    pub fit: f64,
    /// Lower band bound.
    pub lower: f64,
    /// Upper band bound.
    pub upper: f64,
}

/// A log-linear growth model fitted to one segment of an incidence series.
///
/// The model is `ln(count) = intercept + rate * t` with `t` in days since
/// the start of the fitted range; `rate` is the daily exponential growth
/// (or decay) rate. Only bins with a positive count enter the regression,
/// but [`FittedModel::predictions`] covers every bin of the fitted range so
/// the curve can be drawn over the observed one, zero bins included.
#[derive(Debug, Clone)]
pub struct FittedModel {
    /// Group the model applies to; `None` for an ungrouped or pooled series.
    pub group: Option<String>,
    /// Bin-index range the model was fit on, in the series' numbering.
    pub range: Range<usize>,
    /// Daily growth rate (regression slope).
    pub rate: f64,
    /// Standard error of the rate.
    pub rate_se: f64,
    /// Confidence interval for the rate at [`FittedModel::confidence`].
    pub rate_interval: (f64, f64),
    /// Regression intercept, in log-count units.
    pub intercept: f64,
    /// Standard error of the intercept.
    pub intercept_se: f64,
    /// Coefficient of determination of the log-scale regression.
    pub r_squared: f64,
    /// Confidence level used for all intervals.
    pub confidence: f64,
    /// Growth or decay, with the doubling or halving time.
    pub regime: GrowthRegime,
    /// Fitted counts and band per bin over the fitted range.
    pub predictions: Vec<BinPrediction>,
    pub(crate) origin: NaiveDate,
    pub(crate) interval_days: i64,
    pub(crate) regular: bool,
    pub(crate) regression: LinearFit,
}

impl FittedModel {
    /// Date of the model's time origin (start of the first fitted bin).
    pub fn origin(&self) -> NaiveDate {
        self.origin
    }

    /// Number of positive-count bins the regression was fit on.
    pub fn n_fitted_bins(&self) -> usize {
        self.regression.n_observations()
    }

    /// Extend the fitted curve `horizon` bins past the end of the fitted
    /// range.
    ///
    /// Only a model fitted on a regular grid can be projected: on a gapped
    /// grid the dates of the next bins are not defined.
    pub fn project(&self, horizon: usize) -> Result<Vec<BinPrediction>> {
        if horizon == 0 {
            return Err(EpicurveError::InvalidInput(
                "projection horizon must be positive".to_string(),
            ));
        }
        if !self.regular {
            return Err(EpicurveError::InvalidInput(
                "cannot project a model fitted on a non-regular series".to_string(),
            ));
        }

        let fitted_bins = (self.range.end - self.range.start) as i64;
        let xs: Vec<f64> = (0..horizon as i64)
            .map(|k| ((fitted_bins + k) * self.interval_days) as f64)
            .collect();
        let band = self.regression.confidence_band(&xs, self.confidence)?;

        Ok(band
            .into_iter()
            .enumerate()
            .map(|(k, point)| BinPrediction {
                bin: self.range.end + k,
                date: self.origin + Duration::days((fitted_bins + k as i64) * self.interval_days),
                observed: None,
                fit: point.fit.exp(),
                lower: point.lower.exp(),
                upper: point.upper.exp(),
            })
            .collect())
    }
}
