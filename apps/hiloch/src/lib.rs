//! # Hiloch host library
//!
//! The CLI host and its configuration, exposed for the binary and the
//! integration tests.

pub mod cli;
pub mod config;
