//! Optimal-breakpoint search for two-phase epidemic curves.
//!
//! A curve that grows exponentially to a peak and then decays is modelled
//! as two log-linear fits meeting at a split bin. The optimizer scans every
//! admissible split, fits both sides, and keeps the split whose segments
//! explain the log counts best. Grouped series can be split per group or
//! forced to share one split across all groups.

mod optimizer;

pub use optimizer::{
    find_optimal_split, find_optimal_split_per_group, find_optimal_split_shared, fit_split,
    fit_split_date, PerGroupSplit, SharedSplit, SplitConfig, SplitResult,
};
