//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod analyze;
pub mod check_config;
pub mod ingest;
pub mod run;
