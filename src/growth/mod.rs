//! Case-count reconciliation and growth estimation.
//!
//! This module turns raw state and county report rows into per-region case
//! series, corrects over-reported history, estimates growth factor and
//! doubling time over a trailing window, and derives smoothed daily new-case
//! sequences. It performs no I/O.

pub mod assemble;
pub mod increases;
pub mod math;
pub mod metrics;
pub mod series;
pub mod types;
pub mod utility;

pub use assemble::{generate_case_data, generate_new_case_json};
pub use types::{Axis, CaseMap, CaseRecord, CaseRow, GrowthConfig, NewCaseMap, SourceKind};
