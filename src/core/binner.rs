//! Binning of raw case dates onto a fixed-width incidence grid.
//!
//! The binner turns a line list (one record per case, possibly with missing
//! dates or group labels) into an [`IncidenceSeries`]. Unusable records are
//! dropped and tallied rather than failing the whole run; the tallies travel
//! with the series as [`DroppedEvents`].

use crate::core::series::{DroppedEvents, IncidenceSeries};
use crate::error::{EpicurveError, Result};
use chrono::{Duration, NaiveDate};

/// Label assigned to cases without a group under [`GroupPolicy::RetainAsGroup`].
pub const MISSING_GROUP_LABEL: &str = "NA";

/// One case record: an onset date and an optional group label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Onset date; `None` marks a missing date.
    pub date: Option<NaiveDate>,
    /// Group label (sex, ward, region); `None` marks a missing label.
    pub group: Option<String>,
}

impl Event {
    /// A dated, ungrouped case.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            group: None,
        }
    }

    /// Attach a group label.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// How to treat cases whose group label is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupPolicy {
    /// Keep them, collected under the sentinel label `"NA"`. This is the
    /// default: dropping unlabeled cases silently biases the curve downward.
    #[default]
    RetainAsGroup,
    /// Drop them from the counts; the number dropped is reported in
    /// [`DroppedEvents::excluded_group`].
    Exclude,
}

/// Binning configuration.
#[derive(Debug, Clone)]
pub struct BinConfig {
    /// Bin width in days.
    pub interval_days: i64,
    /// First bin start. `None` aligns the grid to the earliest usable date.
    /// When set, cases dated before it are dropped and tallied.
    pub start: Option<NaiveDate>,
    /// Treatment of missing group labels.
    pub group_policy: GroupPolicy,
}

impl Default for BinConfig {
    fn default() -> Self {
        Self {
            interval_days: 1,
            start: None,
            group_policy: GroupPolicy::default(),
        }
    }
}

impl BinConfig {
    /// Daily bins aligned to the earliest date, missing labels retained.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bin width in days.
    pub fn with_interval_days(mut self, days: i64) -> Self {
        self.interval_days = days;
        self
    }

    /// Pin the first bin start instead of deriving it from the data.
    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the missing-group-label policy.
    pub fn with_group_policy(mut self, policy: GroupPolicy) -> Self {
        self.group_policy = policy;
        self
    }
}

/// Bin a line list of [`Event`] records.
///
/// The series is grouped when at least one event carries a label; a line
/// list with no labels at all produces an ungrouped series.
pub fn bin_events(events: &[Event], config: &BinConfig) -> Result<IncidenceSeries> {
    let grouped = events.iter().any(|e| e.group.is_some());
    bin_records(
        events.iter().map(|e| (e.date, e.group.as_deref())),
        events.len(),
        grouped,
        config,
    )
}

/// Bin parallel vectors of dates and (optionally) group labels.
///
/// `groups`, when supplied, must be the same length as `dates`; passing
/// `None` produces an ungrouped series.
pub fn bin_dates(
    dates: &[Option<NaiveDate>],
    groups: Option<&[Option<String>]>,
    config: &BinConfig,
) -> Result<IncidenceSeries> {
    if let Some(groups) = groups {
        if groups.len() != dates.len() {
            return Err(EpicurveError::InvalidInput(format!(
                "{} group labels for {} dates",
                groups.len(),
                dates.len()
            )));
        }
        bin_records(
            dates
                .iter()
                .zip(groups.iter())
                .map(|(&date, group)| (date, group.as_deref())),
            dates.len(),
            true,
            config,
        )
    } else {
        bin_records(
            dates.iter().map(|&date| (date, None)),
            dates.len(),
            false,
            config,
        )
    }
}

impl IncidenceSeries {
    /// Bin fully observed, ungrouped dates at the given interval.
    pub fn from_dates(dates: &[NaiveDate], interval_days: i64) -> Result<IncidenceSeries> {
        let dates: Vec<Option<NaiveDate>> = dates.iter().map(|&d| Some(d)).collect();
        bin_dates(&dates, None, &BinConfig::new().with_interval_days(interval_days))
    }
}

/// Shared binning core over (date, label) records.
///
/// Grid policy: bins start at the configured (or earliest usable) date and
/// advance by whole intervals until the last usable date is covered. The
/// trailing bin is always padded to full width, never truncated, so every
/// bin spans exactly `interval_days`.
fn bin_records<'a>(
    records: impl Iterator<Item = (Option<NaiveDate>, Option<&'a str>)>,
    n_records: usize,
    grouped: bool,
    config: &BinConfig,
) -> Result<IncidenceSeries> {
    if config.interval_days <= 0 {
        return Err(EpicurveError::InvalidInput(format!(
            "interval must be positive, got {} days",
            config.interval_days
        )));
    }
    if n_records == 0 {
        return Err(EpicurveError::InvalidInput(
            "no events supplied".to_string(),
        ));
    }

    // Each dropped event is tallied once, under the first reason that
    // applies: missing date, then before-start, then excluded group.
    let mut dropped = DroppedEvents::default();
    let mut labels: Vec<String> = Vec::new();
    let mut kept: Vec<(NaiveDate, usize)> = Vec::with_capacity(n_records);

    for (date, label) in records {
        let date = match date {
            Some(date) => date,
            None => {
                dropped.missing_date += 1;
                continue;
            }
        };
        if let Some(start) = config.start {
            if date < start {
                dropped.before_start += 1;
                continue;
            }
        }
        let column = if grouped {
            let label = match (label, config.group_policy) {
                (Some(label), _) => label,
                (None, GroupPolicy::RetainAsGroup) => MISSING_GROUP_LABEL,
                (None, GroupPolicy::Exclude) => {
                    dropped.excluded_group += 1;
                    continue;
                }
            };
            match labels.iter().position(|l| l == label) {
                Some(idx) => idx,
                None => {
                    labels.push(label.to_string());
                    labels.len() - 1
                }
            }
        } else {
            0
        };
        kept.push((date, column));
    }

    if kept.is_empty() {
        return Err(EpicurveError::InvalidInput(format!(
            "no usable events: all {n_records} were dropped ({} missing date, \
             {} before start, {} unlabeled)",
            dropped.missing_date, dropped.before_start, dropped.excluded_group
        )));
    }

    let mut earliest = kept[0].0;
    let mut latest = kept[0].0;
    for &(date, _) in &kept {
        earliest = earliest.min(date);
        latest = latest.max(date);
    }
    let start = config.start.unwrap_or(earliest);
    let n_bins = ((latest - start).num_days() / config.interval_days) as usize + 1;

    let n_columns = if grouped { labels.len() } else { 1 };
    let mut counts = vec![vec![0u64; n_bins]; n_columns];
    for (date, column) in kept {
        let bin = ((date - start).num_days() / config.interval_days) as usize;
        counts[column][bin] += 1;
    }

    let bin_starts: Vec<NaiveDate> = (0..n_bins)
        .map(|i| start + Duration::days(config.interval_days * i as i64))
        .collect();
    let groups = if grouped { labels } else { Vec::new() };

    Ok(IncidenceSeries::new(bin_starts, config.interval_days, counts, groups)?
        .with_dropped(dropped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn from_dates_counts_per_weekly_bin() {
        let dates = vec![
            date(2024, 3, 4),
            date(2024, 3, 5),
            date(2024, 3, 10), // still week 0 (ends Mar 11 exclusive)
            date(2024, 3, 11), // week 1
            date(2024, 3, 20), // week 2
            date(2024, 3, 20),
            date(2024, 3, 20),
        ];

        let series = IncidenceSeries::from_dates(&dates, 7).unwrap();

        assert_eq!(series.n_bins(), 3);
        assert!(!series.is_grouped());
        assert!(series.is_regular());
        assert_eq!(series.first_date(), date(2024, 3, 4));
        assert_eq!(series.counts(0).unwrap(), &[3, 1, 3]);
        assert_eq!(series.total_count(), dates.len() as u64);
    }

    #[test]
    fn default_config_uses_daily_bins() {
        let dates = vec![date(2024, 3, 4), date(2024, 3, 6)];
        let series = IncidenceSeries::from_dates(&dates, 1).unwrap();

        // Day without cases is zero-filled, not skipped.
        assert_eq!(series.n_bins(), 3);
        assert_eq!(series.counts(0).unwrap(), &[1, 0, 1]);
        assert_eq!(BinConfig::default().interval_days, 1);
    }

    #[test]
    fn trailing_bin_is_padded_to_full_width() {
        // Last event 10 days after the first: second weekly bin covers
        // days 7..14 even though data stops at day 10.
        let dates = vec![date(2024, 3, 4), date(2024, 3, 14)];
        let series = IncidenceSeries::from_dates(&dates, 7).unwrap();

        assert_eq!(series.n_bins(), 2);
        assert_eq!(series.bin_end(1).unwrap(), date(2024, 3, 18));
        assert_eq!(series.last_date(), date(2024, 3, 18));
    }

    #[test]
    fn missing_dates_are_dropped_and_tallied() {
        let dates = vec![Some(date(2024, 3, 4)), None, Some(date(2024, 3, 5)), None];
        let series = bin_dates(&dates, None, &BinConfig::new()).unwrap();

        assert_eq!(series.total_count(), 2);
        assert_eq!(series.dropped().missing_date, 2);
        assert_eq!(series.dropped().total(), 2);
    }

    #[test]
    fn rejects_unusable_input() {
        // Empty line list
        assert!(matches!(
            IncidenceSeries::from_dates(&[], 7),
            Err(EpicurveError::InvalidInput(_))
        ));

        // All dates missing
        assert!(matches!(
            bin_dates(&[None, None], None, &BinConfig::new()),
            Err(EpicurveError::InvalidInput(_))
        ));

        // Non-positive interval
        assert!(matches!(
            IncidenceSeries::from_dates(&[date(2024, 3, 4)], 0),
            Err(EpicurveError::InvalidInput(_))
        ));
        assert!(IncidenceSeries::from_dates(&[date(2024, 3, 4)], -7).is_err());

        // Group vector length mismatch
        let dates = vec![Some(date(2024, 3, 4)), Some(date(2024, 3, 5))];
        let groups = vec![Some("f".to_string())];
        assert!(matches!(
            bin_dates(&dates, Some(&groups), &BinConfig::new()),
            Err(EpicurveError::InvalidInput(_))
        ));
    }

    #[test]
    fn groups_appear_in_first_seen_order_and_are_zero_filled() {
        let dates: Vec<Option<NaiveDate>> = vec![
            Some(date(2024, 3, 4)),
            Some(date(2024, 3, 4)),
            Some(date(2024, 3, 12)),
            Some(date(2024, 3, 13)),
        ];
        let groups: Vec<Option<String>> = ["male", "female", "female", "female"]
            .iter()
            .map(|s| Some(s.to_string()))
            .collect();

        let series = bin_dates(&dates, Some(&groups), &BinConfig::new().with_interval_days(7))
            .unwrap();

        assert_eq!(series.groups(), &["male", "female"]);
        assert_eq!(series.group_counts("male").unwrap(), &[1, 0]);
        assert_eq!(series.group_counts("female").unwrap(), &[1, 2]);
        assert_eq!(series.total_count(), 4);
    }

    #[test]
    fn missing_labels_are_retained_as_na_group_by_default() {
        let dates: Vec<Option<NaiveDate>> =
            (0..3).map(|i| Some(date(2024, 3, 4 + i))).collect();
        let groups = vec![Some("f".to_string()), None, Some("m".to_string())];

        let series = bin_dates(&dates, Some(&groups), &BinConfig::new().with_interval_days(7))
            .unwrap();

        assert_eq!(series.groups(), &["f", MISSING_GROUP_LABEL, "m"]);
        assert_eq!(series.group_counts("NA").unwrap(), &[1]);
        assert!(series.dropped().is_empty());
    }

    #[test]
    fn exclude_policy_drops_unlabeled_cases() {
        let dates: Vec<Option<NaiveDate>> =
            (0..3).map(|i| Some(date(2024, 3, 4 + i))).collect();
        let groups = vec![Some("f".to_string()), None, Some("m".to_string())];

        let config = BinConfig::new()
            .with_interval_days(7)
            .with_group_policy(GroupPolicy::Exclude);
        let series = bin_dates(&dates, Some(&groups), &config).unwrap();

        assert_eq!(series.groups(), &["f", "m"]);
        assert_eq!(series.total_count(), 2);
        assert_eq!(series.dropped().excluded_group, 1);
    }

    #[test]
    fn explicit_start_pins_grid_and_drops_earlier_cases() {
        let events = vec![
            Event::new(date(2024, 3, 1)), // before the pinned start
            Event::new(date(2024, 3, 8)),
            Event::new(date(2024, 3, 16)),
        ];
        let config = BinConfig::new()
            .with_interval_days(7)
            .with_start(date(2024, 3, 4));

        let series = bin_events(&events, &config).unwrap();

        assert_eq!(series.first_date(), date(2024, 3, 4));
        assert_eq!(series.n_bins(), 2);
        assert_eq!(series.counts(0).unwrap(), &[1, 1]);
        assert_eq!(series.dropped().before_start, 1);

        // Start past every event leaves nothing to bin.
        let too_late = BinConfig::new().with_start(date(2025, 1, 1));
        assert!(bin_events(&events, &too_late).is_err());
    }

    #[test]
    fn bin_events_without_labels_stays_ungrouped() {
        let events = vec![Event::new(date(2024, 3, 4)), Event::new(date(2024, 3, 5))];
        let series = bin_events(&events, &BinConfig::new()).unwrap();

        assert!(!series.is_grouped());

        let labeled = vec![
            Event::new(date(2024, 3, 4)).with_group("icu"),
            Event::new(date(2024, 3, 5)),
        ];
        let series = bin_events(&labeled, &BinConfig::new()).unwrap();
        assert_eq!(series.groups(), &["icu", MISSING_GROUP_LABEL]);
    }
}
