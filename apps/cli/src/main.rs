//! EDD CLI — Enhanced Due Diligence research from the terminal.
//!
//! Runs an agent research pipeline and/or a direct compliance search on a
//! named entity or person and prints a consolidated risk report.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
