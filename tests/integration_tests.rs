//! Integration tests for ferrite-lens.
//!
//! Most tests run against the in-memory client. Tests that need a live
//! server are skipped unless FERRITE_URL is set.
//!
//! Run with: `cargo test --test integration_tests`

mod integration;
