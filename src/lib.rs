//! # epicurve
//!
//! Epidemic-curve analysis: incidence series, growth models, and
//! breakpoint search.
//!
//! Case onset dates are binned into an [`core::IncidenceSeries`] (counts
//! per fixed-width time bin, optionally per group), which supports slicing,
//! pooling, striding, and tabular export. Log-linear growth models fitted
//! to a series report the daily growth rate, doubling or halving time, and
//! a confidence band over the fitted bins; the split optimizer finds the
//! date at which a growth phase turns into decay, and the peak module
//! estimates peak timing by bootstrap.

pub mod core;
pub mod error;
pub mod fit;
pub mod peak;
pub mod split;
pub mod utils;

pub use error::{EpicurveError, Result};

pub mod prelude {
    pub use crate::core::{
        bin_dates, bin_events, BinConfig, Event, GroupPolicy, IncidenceSeries,
    };
    pub use crate::error::{EpicurveError, Result};
    pub use crate::fit::{fit, fit_grouped, FitConfig, FittedModel, GrowthRegime};
    pub use crate::peak::{estimate_peak, find_peak, Peak, PeakConfig};
    pub use crate::split::{find_optimal_split, fit_split, SplitConfig, SplitResult};
}
