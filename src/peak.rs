//! Peak detection and bootstrap peak estimation.
//!
//! The observed peak is the bin with the highest pooled count. Because the
//! observed peak of a noisy curve is itself noisy, [`estimate_peak`] wraps
//! it in a multinomial bootstrap: cases are redistributed over the bins in
//! proportion to the observed counts, the peak of each replicate is taken,
//! and the spread of replicate peaks gives an interval for the peak date.

use crate::core::IncidenceSeries;
use crate::error::{EpicurveError, Result};
use crate::utils::sample_quantile;
use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::SeedableRng;

/// The observed peak of a pooled incidence curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    /// Bin index of the highest pooled count; earliest bin on ties.
    pub bin: usize,
    /// Start date of the peak bin.
    pub date: NaiveDate,
    /// Pooled count in the peak bin.
    pub count: u64,
}

/// Configuration for bootstrap peak estimation.
#[derive(Debug, Clone)]
pub struct PeakConfig {
    /// Number of bootstrap replicates.
    pub n_samples: usize,
    /// Confidence level for the peak-date interval.
    pub confidence: f64,
    /// Random seed for reproducibility (None for random).
    pub seed: Option<u64>,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            confidence: 0.95,
            seed: None,
        }
    }
}

impl PeakConfig {
    /// Create a config with the given number of replicates.
    pub fn new(n_samples: usize) -> Self {
        Self {
            n_samples,
            ..Default::default()
        }
    }

    /// Set the confidence level.
    pub fn with_confidence(mut self, level: f64) -> Self {
        self.confidence = level;
        self
    }

    /// Set the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Observed peak plus a bootstrap interval for its date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakEstimate {
    /// Peak of the observed curve.
    pub observed: Peak,
    /// Lower bound of the peak-date interval.
    pub lower_date: NaiveDate,
    /// Upper bound of the peak-date interval.
    pub upper_date: NaiveDate,
    /// Confidence level of the interval.
    pub confidence: f64,
    /// Number of bootstrap replicates used.
    pub n_samples: usize,
}

/// Find the observed peak of a series, pooling groups first.
///
/// Ties go to the earliest bin.
pub fn find_peak(series: &IncidenceSeries) -> Result<Peak> {
    if series.is_cumulative() {
        return Err(EpicurveError::InvalidInput(
            "peak of a cumulative series is not meaningful".to_string(),
        ));
    }

    let pooled = series.pool();
    let counts = pooled.counts(0)?;
    let mut bin = 0;
    for (i, &count) in counts.iter().enumerate() {
        if count > counts[bin] {
            bin = i;
        }
    }
    if counts[bin] == 0 {
        return Err(EpicurveError::InvalidInput(
            "series has no cases".to_string(),
        ));
    }

    Ok(Peak {
        bin,
        date: series.bin_start(bin)?,
        count: counts[bin],
    })
}

/// Estimate the peak date with a multinomial bootstrap.
///
/// Each replicate redraws the total case count across bins with
/// probabilities proportional to the pooled observed counts, then takes the
/// replicate's peak. Interval bounds are sample quantiles of the replicate
/// peak dates, so they are calendar dates but not necessarily bin starts.
pub fn estimate_peak(series: &IncidenceSeries, config: &PeakConfig) -> Result<PeakEstimate> {
    if config.n_samples == 0 {
        return Err(EpicurveError::InvalidInput(
            "bootstrap needs at least one replicate".to_string(),
        ));
    }
    if !(config.confidence > 0.0 && config.confidence < 1.0) {
        return Err(EpicurveError::InvalidInput(format!(
            "confidence level must be in (0, 1), got {}",
            config.confidence
        )));
    }

    let observed = find_peak(series)?;
    let pooled = series.pool();
    let counts = pooled.counts(0)?;
    let total = pooled.total_count();

    // Inclusive prefix sums; a uniform draw in [0, total) lands in bin i
    // with probability counts[i] / total.
    let cumulative: Vec<u64> = counts
        .iter()
        .scan(0u64, |acc, &c| {
            *acc += c;
            Some(*acc)
        })
        .collect();

    let mut rng: StdRng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let origin = series.first_date();
    let mut peak_offsets = Vec::with_capacity(config.n_samples);
    let mut tally = vec![0u64; counts.len()];
    for _ in 0..config.n_samples {
        tally.iter_mut().for_each(|t| *t = 0);
        for _ in 0..total {
            let u = rng.gen_range(0..total);
            let bin = cumulative.partition_point(|&c| c <= u);
            tally[bin] += 1;
        }

        let mut peak_bin = 0;
        for (i, &count) in tally.iter().enumerate() {
            if count > tally[peak_bin] {
                peak_bin = i;
            }
        }
        peak_offsets.push((series.bin_starts()[peak_bin] - origin).num_days() as f64);
    }

    let alpha = 1.0 - config.confidence;
    let lower = sample_quantile(&peak_offsets, alpha / 2.0);
    let upper = sample_quantile(&peak_offsets, 1.0 - alpha / 2.0);

    Ok(PeakEstimate {
        observed,
        lower_date: origin + Duration::days(lower.round() as i64),
        upper_date: origin + Duration::days(upper.round() as i64),
        confidence: config.confidence,
        n_samples: config.n_samples,
    })
}
