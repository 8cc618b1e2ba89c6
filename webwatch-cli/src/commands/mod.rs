//! Command handlers -- one module per subcommand

pub mod config;
pub mod scan;
pub mod stats;
