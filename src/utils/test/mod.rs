//! Test support
//!
//! Fixture builders shared by unit tests and the integration tests in `tests/`.


// Re-export commonly used items for convenience
pub use fixtures::{cognitive_fixture, write_study_fixture};
pub use sas_writer::{Cell, SasFileBuilder};
