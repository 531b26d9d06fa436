//! Fitting log-linear growth models to incidence series.

use crate::core::IncidenceSeries;
use crate::error::{EpicurveError, Result};
use crate::fit::model::{BinPrediction, FitConfig, FittedModel, GrowthRegime};
use crate::utils::linear_fit;
use std::ops::Range;

/// Minimum positive-count bins a segment must contain to be fit.
const MIN_POSITIVE_BINS: usize = 2;

/// Per-group fit outcomes, in the series' group order.
///
/// A failure in one group never aborts the others; failed groups keep
/// their error in place so the caller can see exactly what went wrong
/// where.
#[derive(Debug, Clone)]
pub struct GroupedFit {
    /// One outcome per group.
    pub fits: Vec<(String, Result<FittedModel>)>,
}

impl GroupedFit {
    /// Successfully fitted groups.
    pub fn models(&self) -> impl Iterator<Item = (&str, &FittedModel)> {
        self.fits
            .iter()
            .filter_map(|(group, fit)| fit.as_ref().ok().map(|m| (group.as_str(), m)))
    }

    /// Groups whose fit failed, with the failure.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &EpicurveError)> {
        self.fits
            .iter()
            .filter_map(|(group, fit)| fit.as_ref().err().map(|e| (group.as_str(), e)))
    }

    /// Outcome for one group.
    pub fn get(&self, group: &str) -> Option<&Result<FittedModel>> {
        self.fits.iter().find(|(g, _)| g == group).map(|(_, fit)| fit)
    }

    /// Number of groups attempted.
    pub fn n_groups(&self) -> usize {
        self.fits.len()
    }

    /// True when every group was fit successfully.
    pub fn all_ok(&self) -> bool {
        self.fits.iter().all(|(_, fit)| fit.is_ok())
    }
}

/// Fit a log-linear growth model to a whole single-column series.
///
/// The series must be ungrouped (or restricted to a single group); pool a
/// grouped series first or use [`fit_grouped`] for per-group models.
///
/// # Example
/// ```
/// use chrono::{Duration, NaiveDate};
/// use epicurve::core::IncidenceSeries;
/// use epicurve::fit::{fit, FitConfig};
///
/// // Cases double every week for five weeks.
/// let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let mut dates = Vec::new();
/// for week in 0..5u32 {
///     for _ in 0..(2u32 << week) {
///         dates.push(start + Duration::days(7 * week as i64));
///     }
/// }
/// let series = IncidenceSeries::from_dates(&dates, 7).unwrap();
///
/// let model = fit(&series, &FitConfig::default()).unwrap();
/// assert!(model.regime.is_growth());
/// assert!((model.rate - 2.0_f64.ln() / 7.0).abs() < 1e-9);
/// ```
pub fn fit(series: &IncidenceSeries, config: &FitConfig) -> Result<FittedModel> {
    fit_range(series, 0..series.n_bins(), config)
}

/// Fit a single-column series on a contiguous bin range `[start, end)`.
pub fn fit_range(
    series: &IncidenceSeries,
    range: Range<usize>,
    config: &FitConfig,
) -> Result<FittedModel> {
    check_fittable(series)?;
    if series.n_groups() > 1 {
        return Err(EpicurveError::InvalidInput(format!(
            "series has {} groups; pool it or use fit_grouped",
            series.n_groups()
        )));
    }
    let group = series.groups().first().cloned();
    fit_column(series, 0, group, range, config)
}

/// Fit every group of a grouped series independently over the whole range.
pub fn fit_grouped(series: &IncidenceSeries, config: &FitConfig) -> Result<GroupedFit> {
    fit_grouped_range(series, 0..series.n_bins(), config)
}

/// Fit every group of a grouped series on a contiguous bin range.
pub fn fit_grouped_range(
    series: &IncidenceSeries,
    range: Range<usize>,
    config: &FitConfig,
) -> Result<GroupedFit> {
    check_fittable(series)?;
    if !series.is_grouped() {
        return Err(EpicurveError::InvalidInput(
            "series has no groups; use fit".to_string(),
        ));
    }

    let fits = series
        .groups()
        .iter()
        .enumerate()
        .map(|(column, group)| {
            let fit = fit_column(series, column, Some(group.clone()), range.clone(), config);
            (group.clone(), fit)
        })
        .collect();
    Ok(GroupedFit { fits })
}

fn check_fittable(series: &IncidenceSeries) -> Result<()> {
    if series.is_cumulative() {
        return Err(EpicurveError::InvalidInput(
            "cannot fit a growth model to a cumulative series".to_string(),
        ));
    }
    Ok(())
}

/// Regression core shared by all fit entry points.
///
/// `t` is measured in days from the start of the first bin of the range, so
/// the rate comes out in per-day units on any grid, gapped grids included.
/// Zero-count bins are left out of the regression (log of zero) but still
/// receive a prediction.
fn fit_column(
    series: &IncidenceSeries,
    column: usize,
    group: Option<String>,
    range: Range<usize>,
    config: &FitConfig,
) -> Result<FittedModel> {
    if range.start >= range.end || range.end > series.n_bins() {
        return Err(EpicurveError::InvalidInput(format!(
            "bin range {}..{} invalid for a series of {} bins",
            range.start,
            range.end,
            series.n_bins()
        )));
    }

    let counts = series.counts(column)?;
    let starts = series.bin_starts();
    let origin = starts[range.start];

    let mut xs = Vec::with_capacity(range.len());
    let mut ys = Vec::with_capacity(range.len());
    for bin in range.clone() {
        if counts[bin] > 0 {
            xs.push((starts[bin] - origin).num_days() as f64);
            ys.push((counts[bin] as f64).ln());
        }
    }
    if xs.len() < MIN_POSITIVE_BINS {
        return Err(EpicurveError::InsufficientData {
            needed: MIN_POSITIVE_BINS,
            got: xs.len(),
        });
    }

    let regression = linear_fit(&xs, &ys)?;
    let rate_interval = regression.slope_interval(config.confidence)?;

    let band_xs: Vec<f64> = range
        .clone()
        .map(|bin| (starts[bin] - origin).num_days() as f64)
        .collect();
    let band = regression.confidence_band(&band_xs, config.confidence)?;
    let predictions: Vec<BinPrediction> = range
        .clone()
        .zip(band)
        .map(|(bin, point)| BinPrediction {
            bin,
            date: starts[bin],
            observed: Some(counts[bin]),
            fit: point.fit.exp(),
            lower: point.lower.exp(),
            upper: point.upper.exp(),
        })
        .collect();

    Ok(FittedModel {
        group,
        range,
        rate: regression.slope,
        rate_se: regression.slope_se,
        rate_interval,
        intercept: regression.intercept,
        intercept_se: regression.intercept_se,
        r_squared: regression.r_squared,
        confidence: config.confidence,
        regime: GrowthRegime::from_rate(regression.slope, rate_interval),
        predictions,
        origin,
        interval_days: series.interval_days(),
        regular: series.is_regular(),
        regression,
    })
}
