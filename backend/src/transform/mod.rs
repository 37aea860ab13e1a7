//! Report transformation: the four pipeline stages plus orchestration.
//!
//! - [`sanitize`] - column pruning and schema validation
//! - [`filter`] - vendor / destination row filter
//! - [`recalc`] - numeric coercion and zero-cost vendor recalculation
//! - [`grouper`] - grouping, subtotals and spacers
//! - [`pipeline`] - ties the stages together

pub mod filter;
pub mod grouper;
pub mod pipeline;
pub mod recalc;
pub mod sanitize;

pub use filter::filter_rows;
pub use grouper::{group_with_subtotals, GroupedRows, SPACER_ROWS_BETWEEN_GROUPS};
pub use recalc::{coerce_and_recalculate, RecalcResult, ZeroCostMatcher, DEFAULT_ZERO_COST_VENDORS};
pub use sanitize::{sanitize, SanitizedTable, DROPPED_COLUMNS, REQUIRED_COLUMNS};
