//! Core data structures: the date binner and the incidence series it builds.

mod binner;
mod series;

pub use binner::{bin_dates, bin_events, BinConfig, Event, GroupPolicy, MISSING_GROUP_LABEL};
pub use series::{DroppedEvents, IncidenceSeries, TableRow};
