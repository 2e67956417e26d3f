//! Data preparation for completed trials.
//!
//! Turns raw [`TrialResult`](crate::trial::TrialResult) logs into
//! per-word dwell intervals and flat geometry rows. No statistics are
//! computed here.

pub mod measures;

pub use measures::{Dwell, GeometryRow, Measures, ReadingMeasure, derive, dwell_times, geometry_rows};
