//! Integration tests for ferrite-lens.
//!
//! Live server tests require FERRITE_URL, e.g. `redis://localhost:6379/15`.

pub mod browse_test;
pub mod execute_test;
pub mod server_test;
