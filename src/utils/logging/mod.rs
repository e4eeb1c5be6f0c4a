//! Logging utilities for output and progress tracking
//!
//! This module provides utilities for logging, console output, and progress tracking.

pub mod console;
pub mod log;
pub mod progress;

// Re-export commonly used functions for convenience
pub use console::{print_sas_metadata, print_schema, print_table_summary};
pub use self::log::{log_empty_table, log_table_loaded, log_table_read, log_table_written};
pub use progress::{StageProgress, create_spinner, finish_progress_bar};
