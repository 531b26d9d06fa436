//! Incidence series: event counts on a fixed-width time grid.

use crate::error::{EpicurveError, Result};
use chrono::{Duration, NaiveDate};
use std::ops::Range;

/// Tally of input events excluded during binning.
///
/// Binning never fails on individual unusable events; it drops them and
/// records how many were dropped so callers can detect silent data loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DroppedEvents {
    /// Events with no date.
    pub missing_date: usize,
    /// Events whose group label was missing under `GroupPolicy::Exclude`.
    pub excluded_group: usize,
    /// Events dated before an explicitly supplied grid start.
    pub before_start: usize,
}

impl DroppedEvents {
    /// Total number of dropped events.
    pub fn total(&self) -> usize {
        self.missing_date + self.excluded_group + self.before_start
    }

    /// True when nothing was dropped.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// One row of the tabular export: a single (bin, group) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Inclusive start of the bin.
    pub bin_start: NaiveDate,
    /// Exclusive end of the bin.
    pub bin_end: NaiveDate,
    /// Group label; `None` for an ungrouped series.
    pub group: Option<String>,
    /// Event count in this cell.
    pub count: u64,
}

/// Counts of dated events per time bin, optionally partitioned into groups.
///
/// Bins are start-inclusive, end-exclusive and share one fixed width
/// (`interval_days`). Counts are stored column-major as
/// `counts[group][bin]`, zero-filled so every bin has an entry for every
/// group; an ungrouped series has exactly one column and no labels. All
/// operations return new instances; a series is never mutated in place.
#[derive(Debug, Clone)]
pub struct IncidenceSeries {
    bin_starts: Vec<NaiveDate>,
    interval_days: i64,
    /// Column-major counts: counts[group][bin].
    counts: Vec<Vec<u64>>,
    /// Group labels in first-seen order; empty for an ungrouped series.
    groups: Vec<String>,
    regular: bool,
    cumulative: bool,
    dropped: DroppedEvents,
}

impl IncidenceSeries {
    /// Create a series from an explicit grid and count matrix.
    ///
    /// `groups` may be empty (ungrouped, exactly one count column) or must
    /// supply one unique label per column. Bin starts must be strictly
    /// increasing; the width of every bin is `interval_days`.
    pub fn new(
        bin_starts: Vec<NaiveDate>,
        interval_days: i64,
        counts: Vec<Vec<u64>>,
        groups: Vec<String>,
    ) -> Result<Self> {
        if interval_days <= 0 {
            return Err(EpicurveError::InvalidInput(format!(
                "interval must be positive, got {interval_days} days"
            )));
        }
        if bin_starts.is_empty() {
            return Err(EpicurveError::InvalidInput(
                "series must contain at least one bin".to_string(),
            ));
        }
        for window in bin_starts.windows(2) {
            if window[1] <= window[0] {
                return Err(EpicurveError::InvalidInput(
                    "bin starts must be strictly increasing".to_string(),
                ));
            }
        }
        if counts.is_empty() {
            return Err(EpicurveError::InvalidInput(
                "series must contain at least one count column".to_string(),
            ));
        }
        for column in &counts {
            if column.len() != bin_starts.len() {
                return Err(EpicurveError::InvalidInput(format!(
                    "count column length {} does not match bin count {}",
                    column.len(),
                    bin_starts.len()
                )));
            }
        }
        if groups.is_empty() {
            if counts.len() != 1 {
                return Err(EpicurveError::InvalidInput(format!(
                    "ungrouped series must have exactly one count column, got {}",
                    counts.len()
                )));
            }
        } else {
            if groups.len() != counts.len() {
                return Err(EpicurveError::InvalidInput(format!(
                    "{} group labels for {} count columns",
                    groups.len(),
                    counts.len()
                )));
            }
            for (i, label) in groups.iter().enumerate() {
                if groups[..i].contains(label) {
                    return Err(EpicurveError::InvalidInput(format!(
                        "duplicate group label: {label}"
                    )));
                }
            }
        }

        let regular = regular_spacing(&bin_starts, interval_days);
        Ok(Self {
            bin_starts,
            interval_days,
            counts,
            groups,
            regular,
            cumulative: false,
            dropped: DroppedEvents::default(),
        })
    }

    /// Attach binning diagnostics; used by the binner.
    pub(crate) fn with_dropped(mut self, dropped: DroppedEvents) -> Self {
        self.dropped = dropped;
        self
    }

    /// Number of time bins.
    pub fn n_bins(&self) -> usize {
        self.bin_starts.len()
    }

    /// Number of count columns (1 for an ungrouped series).
    pub fn n_groups(&self) -> usize {
        self.counts.len()
    }

    /// Whether the series carries group labels.
    pub fn is_grouped(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Group labels in first-seen order; empty for an ungrouped series.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Position of a group label, if present.
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g == name)
    }

    /// Bin start dates (inclusive bounds).
    pub fn bin_starts(&self) -> &[NaiveDate] {
        &self.bin_starts
    }

    /// Start date of one bin.
    pub fn bin_start(&self, bin: usize) -> Result<NaiveDate> {
        self.bin_starts
            .get(bin)
            .copied()
            .ok_or_else(|| self.bin_range_error(bin))
    }

    /// Exclusive end date of one bin (`start + interval`).
    pub fn bin_end(&self, bin: usize) -> Result<NaiveDate> {
        Ok(self.bin_start(bin)? + Duration::days(self.interval_days))
    }

    /// Bin width in days; identical for every bin.
    pub fn interval_days(&self) -> i64 {
        self.interval_days
    }

    /// True when consecutive bin starts are exactly one interval apart.
    ///
    /// Stride selection produces gapped grids and clears this flag; fitted
    /// models on a non-regular series cannot project beyond their own bins.
    pub fn is_regular(&self) -> bool {
        self.regular
    }

    /// True for a cumulated series; such a series cannot be fit.
    pub fn is_cumulative(&self) -> bool {
        self.cumulative
    }

    /// Diagnostics about events excluded during binning.
    pub fn dropped(&self) -> DroppedEvents {
        self.dropped
    }

    /// Start of the first bin.
    pub fn first_date(&self) -> NaiveDate {
        self.bin_starts[0]
    }

    /// Exclusive end of the last bin.
    pub fn last_date(&self) -> NaiveDate {
        // Constructor guarantees at least one bin.
        self.bin_starts[self.n_bins() - 1] + Duration::days(self.interval_days)
    }

    /// Days covered by the grid, from the first bin start to the last bin end.
    pub fn timespan_days(&self) -> i64 {
        (self.last_date() - self.first_date()).num_days()
    }

    /// Counts for one column.
    pub fn counts(&self, column: usize) -> Result<&[u64]> {
        self.counts.get(column).map(|c| c.as_slice()).ok_or_else(|| {
            EpicurveError::InvalidInput(format!(
                "column index {column} out of range ({} columns)",
                self.counts.len()
            ))
        })
    }

    /// Counts for a named group.
    pub fn group_counts(&self, name: &str) -> Result<&[u64]> {
        let idx = self.group_index(name).ok_or_else(|| {
            EpicurveError::InvalidInput(format!("unknown group: {name}"))
        })?;
        self.counts(idx)
    }

    /// All count columns, column-major.
    pub fn columns(&self) -> &[Vec<u64>] {
        &self.counts
    }

    /// Sum of all counts across bins and groups.
    pub fn total_count(&self) -> u64 {
        self.counts
            .iter()
            .map(|column| column.iter().sum::<u64>())
            .sum()
    }

    /// Restrict to the bin range `[range.start, range.end)`.
    ///
    /// Zero-count bins inside the range are preserved so time continuity is
    /// retained; bin edges are unchanged.
    pub fn slice_bins(&self, range: Range<usize>) -> Result<IncidenceSeries> {
        if range.start >= range.end {
            return Err(EpicurveError::InvalidInput(format!(
                "bin range {}..{} is empty",
                range.start, range.end
            )));
        }
        if range.end > self.n_bins() {
            return Err(EpicurveError::InvalidInput(format!(
                "bin range {}..{} exceeds series length {}",
                range.start,
                range.end,
                self.n_bins()
            )));
        }

        let bin_starts = self.bin_starts[range.clone()].to_vec();
        let counts: Vec<Vec<u64>> = self
            .counts
            .iter()
            .map(|column| column[range.clone()].to_vec())
            .collect();
        let regular = regular_spacing(&bin_starts, self.interval_days);

        Ok(IncidenceSeries {
            bin_starts,
            interval_days: self.interval_days,
            counts,
            groups: self.groups.clone(),
            regular,
            cumulative: self.cumulative,
            dropped: self.dropped,
        })
    }

    /// Restrict to the named groups, in the requested order.
    pub fn slice_groups(&self, names: &[&str]) -> Result<IncidenceSeries> {
        if !self.is_grouped() {
            return Err(EpicurveError::InvalidInput(
                "series has no groups to select".to_string(),
            ));
        }
        if names.is_empty() {
            return Err(EpicurveError::InvalidInput(
                "no groups selected".to_string(),
            ));
        }

        let mut groups = Vec::with_capacity(names.len());
        let mut counts = Vec::with_capacity(names.len());
        for &name in names {
            if groups.iter().any(|g: &String| g == name) {
                return Err(EpicurveError::InvalidInput(format!(
                    "group selected twice: {name}"
                )));
            }
            let idx = self.group_index(name).ok_or_else(|| {
                EpicurveError::InvalidInput(format!("unknown group: {name}"))
            })?;
            groups.push(name.to_string());
            counts.push(self.counts[idx].clone());
        }

        Ok(IncidenceSeries {
            bin_starts: self.bin_starts.clone(),
            interval_days: self.interval_days,
            counts,
            groups,
            regular: self.regular,
            cumulative: self.cumulative,
            dropped: self.dropped,
        })
    }

    /// Restrict to the `[from, to)` date window.
    ///
    /// Every bin overlapping the window is kept, including bins the window
    /// only partially covers. `None` leaves that side unbounded.
    pub fn slice_dates(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<IncidenceSeries> {
        if let (Some(from), Some(to)) = (from, to) {
            if from >= to {
                return Err(EpicurveError::InvalidInput(format!(
                    "date window {from}..{to} is empty"
                )));
            }
        }

        let width = Duration::days(self.interval_days);
        let kept: Vec<usize> = (0..self.n_bins())
            .filter(|&i| {
                let start = self.bin_starts[i];
                let end = start + width;
                from.map_or(true, |f| end > f) && to.map_or(true, |t| start < t)
            })
            .collect();

        let (first, last) = match (kept.first(), kept.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => {
                return Err(EpicurveError::InvalidInput(
                    "date window selects no bins".to_string(),
                ))
            }
        };
        // Bin starts are increasing, so the overlap predicate selects a
        // contiguous index range.
        self.slice_bins(first..last + 1)
    }

    /// Keep every `step`-th bin, re-indexed contiguously.
    ///
    /// The result is a new ordered series whose bins keep their original
    /// width but no longer tile the timeline; for `step > 1` it is flagged
    /// non-regular.
    pub fn stride(&self, step: usize) -> Result<IncidenceSeries> {
        if step == 0 {
            return Err(EpicurveError::InvalidInput(
                "stride step must be positive".to_string(),
            ));
        }

        let bin_starts: Vec<NaiveDate> =
            self.bin_starts.iter().step_by(step).copied().collect();
        let counts: Vec<Vec<u64>> = self
            .counts
            .iter()
            .map(|column| column.iter().step_by(step).copied().collect())
            .collect();
        // Forced for step > 1: a one-bin result has no gap for the
        // spacing check to fail on.
        let regular = step == 1 && regular_spacing(&bin_starts, self.interval_days);

        Ok(IncidenceSeries {
            bin_starts,
            interval_days: self.interval_days,
            counts,
            groups: self.groups.clone(),
            regular,
            cumulative: self.cumulative,
            dropped: self.dropped,
        })
    }

    /// Collapse all groups into a single ungrouped series by summing counts
    /// per bin. Sums are exact (integer addition).
    pub fn pool(&self) -> IncidenceSeries {
        let pooled: Vec<u64> = (0..self.n_bins())
            .map(|bin| self.counts.iter().map(|column| column[bin]).sum())
            .collect();

        IncidenceSeries {
            bin_starts: self.bin_starts.clone(),
            interval_days: self.interval_days,
            counts: vec![pooled],
            groups: Vec::new(),
            regular: self.regular,
            cumulative: self.cumulative,
            dropped: self.dropped,
        }
    }

    /// Running cumulative counts per group.
    ///
    /// The result is flagged cumulative and cannot be fit: a regression on
    /// cumulative counts does not estimate a growth rate.
    pub fn cumulate(&self) -> Result<IncidenceSeries> {
        if self.cumulative {
            return Err(EpicurveError::InvalidInput(
                "series is already cumulative".to_string(),
            ));
        }

        let counts: Vec<Vec<u64>> = self
            .counts
            .iter()
            .map(|column| {
                column
                    .iter()
                    .scan(0u64, |acc, &c| {
                        *acc += c;
                        Some(*acc)
                    })
                    .collect()
            })
            .collect();

        Ok(IncidenceSeries {
            bin_starts: self.bin_starts.clone(),
            interval_days: self.interval_days,
            counts,
            groups: self.groups.clone(),
            regular: self.regular,
            cumulative: true,
            dropped: self.dropped,
        })
    }

    /// Flatten to rows of (bin_start, bin_end, group, count), bin-major with
    /// groups in series order inside each bin.
    pub fn to_table(&self) -> Vec<TableRow> {
        let width = Duration::days(self.interval_days);
        let mut rows = Vec::with_capacity(self.n_bins() * self.n_groups());
        for (bin, &start) in self.bin_starts.iter().enumerate() {
            for (column, counts) in self.counts.iter().enumerate() {
                rows.push(TableRow {
                    bin_start: start,
                    bin_end: start + width,
                    group: self.groups.get(column).cloned(),
                    count: counts[bin],
                });
            }
        }
        rows
    }

    fn bin_range_error(&self, bin: usize) -> EpicurveError {
        EpicurveError::InvalidInput(format!(
            "bin index {bin} out of range ({} bins)",
            self.n_bins()
        ))
    }
}

/// True when consecutive starts are exactly `interval_days` apart.
fn regular_spacing(bin_starts: &[NaiveDate], interval_days: i64) -> bool {
    bin_starts
        .windows(2)
        .all(|w| (w[1] - w[0]).num_days() == interval_days)
}
