//! Shared helpers: column lookup, logging and progress, test fixtures

pub mod columns;
pub mod logging;
pub mod test;
