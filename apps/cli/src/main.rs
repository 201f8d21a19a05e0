//! jobscout CLI — scheduled job-listing aggregation and application drafting.
//!
//! Polls configured listing boards, ranks fresh postings against the
//! applicant profile, and drafts cover letters for the best matches.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
