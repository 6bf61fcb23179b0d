//! Lodestone CLI: convert Lodestone announcement HTML for Discord.
//!
//! Reads HTML or parsed-news JSON from a file or stdin and prints Markdown,
//! Components v2 JSON, or extracted timestamps.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
