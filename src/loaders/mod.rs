//! Loaders for the three study tables
//!
//! Each loader returns a single `RecordBatch` for its input file.

pub mod cognitive;
pub mod tabular;

pub use cognitive::{derive_apoe4, load_cognitive, load_variable_list, recode_sentinels, select_columns};
pub use tabular::{load_pupil, load_task};
