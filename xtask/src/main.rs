//! Build automation tasks for the quest pipeline
//!
//! This tool provides various automation tasks for the project, including:
//! - Generating CLI documentation from source code
//! - Future build-related tasks

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for the quest pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate CLI documentation in markdown format
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    // Generate markdown from clap definitions
    let markdown = clap_markdown::help_markdown::<quest_cli::Cli>();

    let content = format!(
        r#"# Quest CLI Reference

This documentation is auto-generated from the CLI source code. Last updated: {}.

## Overview

`quest` operates the Rearc data quest pipeline: a scheduled ingest task that
syncs BLS time-series files and the DataUSA population series into an object
store, and a queue-driven analytics task that computes reports over the
stored artifacts.

## Installation

```bash
git clone https://github.com/rearc-data/quest-pipeline.git
cd quest-pipeline
cargo install --path crates/quest-cli
```

## Quick Start

```bash
# Validate the configuration
quest check-config

# Run one ingest pass
quest ingest

# Run analytics against the stored artifacts
quest analyze --pretty

# Run the full pipeline until interrupted
quest run
```

## Commands

{}

## Environment Variables

- `REARC_BUCKET` - Destination bucket (required)
- `BLS_BASE` - Base URL for BLS source files
- `BLS_INDEX` - Listing URL for BLS file discovery (defaults to `BLS_BASE`)
- `DATAUSA_URL` - DataUSA population endpoint
- `REARC_POP_KEY` - Destination key for the population artifact
- `BLS_KEY` / `POP_KEY` - Source keys the analytics task reads
- `QUEST_SCHEDULE_PERIOD` - Seconds between ingest runs
- `QUEST_TASK_TIMEOUT` - Upper bound on one task invocation, in seconds
- `QUEST_VISIBILITY_TIMEOUT` - Queue visibility timeout, in seconds
- `QUEST_MAX_RECEIVE_COUNT` - Receives before a message is dead-lettered
- `QUEST_BATCH_SIZE` - Messages pulled per consumer poll
- `S3_ENDPOINT` / `S3_REGION` / `S3_ACCESS_KEY` / `S3_SECRET_KEY` / `S3_PATH_STYLE` - Storage backend
- `LOG_LEVEL` / `LOG_OUTPUT` / `LOG_FORMAT` / `LOG_DIR` / `LOG_FILTER` - Logging

---

*This documentation is automatically generated from the CLI source code. To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    // Create output directory if it doesn't exist
    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    // Write the markdown file
    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
