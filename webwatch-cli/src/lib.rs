//! webwatch CLI library.
//!
//! Command handlers live here so integration tests can drive them directly;
//! `main.rs` only parses arguments, initializes logging and maps errors to
//! exit codes.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
