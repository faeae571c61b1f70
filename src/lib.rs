//! ferrite-lens - A lightweight terminal client for Ferrite servers.
//!
//! This library exposes the core modules for use by the binary and integration tests.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod info;
pub mod keyspace;
pub mod logging;
pub mod shell;
