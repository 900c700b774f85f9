//! Command-line entry point for cachesight.

use anyhow::Result;
use cachesight_recommender::cli::{run_cli, Cli};
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
