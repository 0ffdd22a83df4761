//! Quest CLI Library
//!
//! Command-line interface for operating the Rearc data quest pipeline:
//!
//! - **One-shot ingest**: run the BLS sync and population fetch once (`quest ingest`)
//! - **One-shot analytics**: run the analytics task for a key (`quest analyze`)
//! - **Pipeline mode**: scheduler, queue, and consumer in one process (`quest run`)
//! - **Configuration**: validate and print the effective config (`quest check-config`)

pub mod commands;

use clap::{Parser, Subcommand};

/// Quest - Rearc data quest pipeline
#[derive(Parser, Debug)]
#[command(name = "quest")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print CLI reference as markdown and exit
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingest task once: sync BLS files and publish the population artifact
    Ingest,

    /// Run the analytics task once against the stored artifacts
    Analyze {
        /// Object key to attribute the run to (defaults to the population key)
        #[arg(short, long)]
        key: Option<String>,

        /// Pretty-print the report as JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Run the full pipeline: scheduled ingest, notifications, and the consumer
    Run,

    /// Validate the configuration and print the effective values
    CheckConfig,
}
