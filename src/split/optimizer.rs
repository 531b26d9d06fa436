//! Breakpoint search over candidate split bins.

use crate::core::IncidenceSeries;
use crate::error::{EpicurveError, Result};
use crate::fit::{fit_grouped_range, fit_range, FitConfig, FittedModel, GroupedFit};
use chrono::{Duration, NaiveDate};

/// Configuration for the split search.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Minimum bins each side of a candidate split must contain. At least 2,
    /// since a growth model needs two positive bins.
    pub min_side_bins: usize,
    /// Confidence level passed through to the segment fits.
    pub confidence: f64,
    /// Evaluate at most this many candidates, earliest first. `None` scans
    /// the whole interior.
    pub max_candidates: Option<usize>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            min_side_bins: 2,
            confidence: 0.95,
            max_candidates: None,
        }
    }
}

impl SplitConfig {
    /// Full interior scan at 95% confidence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum bins per side.
    pub fn with_min_side_bins(mut self, bins: usize) -> Self {
        self.min_side_bins = bins;
        self
    }

    /// Set the confidence level for the segment fits.
    pub fn with_confidence(mut self, level: f64) -> Self {
        self.confidence = level;
        self
    }

    /// Cap the number of candidates evaluated.
    pub fn with_max_candidates(mut self, limit: usize) -> Self {
        self.max_candidates = Some(limit);
        self
    }
}

/// A split of a single-column series into a before and an after model.
///
/// The split bin belongs to both segments: the before model ends on it and
/// the after model starts on it, so the two fitted curves meet at the peak
/// instead of leaving a one-bin hole.
#[derive(Debug, Clone)]
pub struct SplitResult {
    /// Bin index of the split, in the series' numbering.
    pub split_bin: usize,
    /// Start date of the split bin.
    pub split_date: NaiveDate,
    /// Mean of the two segments' log-scale R².
    pub score: f64,
    /// Model for bins `0..=split_bin`.
    pub before: FittedModel,
    /// Model for bins `split_bin..n`.
    pub after: FittedModel,
}

/// Per-group split outcomes, in the series' group order.
#[derive(Debug, Clone)]
pub struct PerGroupSplit {
    /// One outcome per group; groups without a valid split keep their error.
    pub splits: Vec<(String, Result<SplitResult>)>,
}

impl PerGroupSplit {
    /// Groups with a valid split.
    pub fn found(&self) -> impl Iterator<Item = (&str, &SplitResult)> {
        self.splits
            .iter()
            .filter_map(|(group, split)| split.as_ref().ok().map(|s| (group.as_str(), s)))
    }

    /// Groups whose search failed, with the failure.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &EpicurveError)> {
        self.splits
            .iter()
            .filter_map(|(group, split)| split.as_ref().err().map(|e| (group.as_str(), e)))
    }

    /// Outcome for one group.
    pub fn get(&self, group: &str) -> Option<&Result<SplitResult>> {
        self.splits.iter().find(|(g, _)| g == group).map(|(_, s)| s)
    }

    /// True when every group found a split.
    pub fn all_ok(&self) -> bool {
        self.splits.iter().all(|(_, split)| split.is_ok())
    }
}

/// One split shared by all groups of a grouped series.
///
/// A candidate qualifies only when every group fits on both sides, so
/// `before` and `after` hold a model for each group.
#[derive(Debug, Clone)]
pub struct SharedSplit {
    /// Bin index of the shared split.
    pub split_bin: usize,
    /// Start date of the split bin.
    pub split_date: NaiveDate,
    /// Mean log-scale R² over all groups and both segments.
    pub score: f64,
    /// Per-group models for bins `0..=split_bin`.
    pub before: GroupedFit,
    /// Per-group models for bins `split_bin..n`.
    pub after: GroupedFit,
}

/// Fit growth and decay models around an explicit split bin.
///
/// The series must be single-column, like [`fit_range`]. Fit errors on
/// either side propagate unchanged; `NoValidSplit` is reserved for the
/// exhausted searches.
pub fn fit_split(
    series: &IncidenceSeries,
    split_bin: usize,
    config: &SplitConfig,
) -> Result<SplitResult> {
    let n = series.n_bins();
    if split_bin >= n {
        return Err(EpicurveError::InvalidInput(format!(
            "split bin {split_bin} out of range ({n} bins)"
        )));
    }

    let fit_config = FitConfig::new().with_confidence(config.confidence);
    let before = fit_range(series, 0..split_bin + 1, &fit_config)?;
    let after = fit_range(series, split_bin..n, &fit_config)?;
    let score = pair_score(&before, &after);

    Ok(SplitResult {
        split_bin,
        split_date: series.bin_start(split_bin)?,
        score,
        before,
        after,
    })
}

/// Fit models around the bin containing an explicit split date.
pub fn fit_split_date(
    series: &IncidenceSeries,
    date: NaiveDate,
    config: &SplitConfig,
) -> Result<SplitResult> {
    let width = Duration::days(series.interval_days());
    let split_bin = series
        .bin_starts()
        .iter()
        .position(|&start| date >= start && date < start + width)
        .ok_or_else(|| {
            EpicurveError::InvalidInput(format!("split date {date} falls in no bin of the series"))
        })?;
    fit_split(series, split_bin, config)
}

/// Search all interior candidate bins for the best-scoring split.
///
/// Candidates leave at least `min_side_bins` bins on each side. Every
/// candidate is scored by the mean of its two segments' log-scale R², the
/// highest mean wins and ties go to the earliest bin. Candidates where
/// either side cannot be fit are skipped; if that skips them all, the
/// search fails with `NoValidSplit`.
///
/// The scan is brute force, one pair of fits per candidate. Bin counts are
/// tens to low hundreds and the search runs once per analysis, so the
/// quadratic work is immaterial.
pub fn find_optimal_split(series: &IncidenceSeries, config: &SplitConfig) -> Result<SplitResult> {
    check_search_config(config)?;

    let mut best: Option<SplitResult> = None;
    for split_bin in candidate_bins(series.n_bins(), config)? {
        let candidate = match fit_split(series, split_bin, config) {
            Ok(candidate) => candidate,
            // A side with too few positive bins or a degenerate regression
            // just disqualifies this candidate.
            Err(EpicurveError::InsufficientData { .. })
            | Err(EpicurveError::ModelFitFailure(_)) => continue,
            Err(e) => return Err(e),
        };
        if best.as_ref().map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }

    best.ok_or_else(|| no_valid_split(series.n_bins(), config))
}

/// Search for an independent optimal split in every group.
///
/// One group failing its search never aborts the others.
pub fn find_optimal_split_per_group(
    series: &IncidenceSeries,
    config: &SplitConfig,
) -> Result<PerGroupSplit> {
    check_search_config(config)?;
    check_grouped(series)?;

    let mut splits = Vec::with_capacity(series.n_groups());
    for group in series.groups() {
        let single = series.slice_groups(&[group.as_str()])?;
        splits.push((group.clone(), find_optimal_split(&single, config)));
    }
    Ok(PerGroupSplit { splits })
}

/// Search for one split shared by every group of a grouped series.
///
/// A candidate bin qualifies only when every group fits on both sides; the
/// score averages the log-scale R² over all groups and both segments.
pub fn find_optimal_split_shared(
    series: &IncidenceSeries,
    config: &SplitConfig,
) -> Result<SharedSplit> {
    check_search_config(config)?;
    check_grouped(series)?;

    let n = series.n_bins();
    let fit_config = FitConfig::new().with_confidence(config.confidence);
    let mut best: Option<SharedSplit> = None;
    for split_bin in candidate_bins(n, config)? {
        let before = fit_grouped_range(series, 0..split_bin + 1, &fit_config)?;
        let after = fit_grouped_range(series, split_bin..n, &fit_config)?;
        if !before.all_ok() || !after.all_ok() {
            continue;
        }

        let mut sum = 0.0;
        let mut models = 0usize;
        for (_, model) in before.models().chain(after.models()) {
            sum += model.r_squared;
            models += 1;
        }
        let score = sum / models as f64;

        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(SharedSplit {
                split_bin,
                split_date: series.bin_start(split_bin)?,
                score,
                before,
                after,
            });
        }
    }

    best.ok_or_else(|| no_valid_split(n, config))
}

fn pair_score(before: &FittedModel, after: &FittedModel) -> f64 {
    (before.r_squared + after.r_squared) / 2.0
}

fn check_search_config(config: &SplitConfig) -> Result<()> {
    if config.min_side_bins < 2 {
        return Err(EpicurveError::InvalidInput(format!(
            "min_side_bins must be at least 2, got {}",
            config.min_side_bins
        )));
    }
    Ok(())
}

fn check_grouped(series: &IncidenceSeries) -> Result<()> {
    if !series.is_grouped() {
        return Err(EpicurveError::InvalidInput(
            "series has no groups; use find_optimal_split".to_string(),
        ));
    }
    Ok(())
}

/// Interior candidate bins, truncated to the configured budget.
fn candidate_bins(
    n_bins: usize,
    config: &SplitConfig,
) -> Result<impl Iterator<Item = usize>> {
    // Both sides count the split bin, so the shortest splittable series
    // has 2 * min_side_bins - 1 bins.
    if n_bins < 2 * config.min_side_bins - 1 {
        return Err(no_valid_split(n_bins, config));
    }
    // Split bin k keeps k + 1 bins on the before side and n - k on the
    // after side.
    let first = config.min_side_bins - 1;
    let last = n_bins - config.min_side_bins;
    let budget = config.max_candidates.unwrap_or(usize::MAX);
    Ok((first..=last).take(budget))
}

fn no_valid_split(n_bins: usize, config: &SplitConfig) -> EpicurveError {
    EpicurveError::NoValidSplit(format!(
        "no split of a {n_bins}-bin series leaves {} fittable bins on each side",
        config.min_side_bins
    ))
}
