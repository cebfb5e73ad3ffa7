use anyhow::Result;
use clap::Parser;

use gridalign::cli::Cli;
use gridalign::commands::align;

fn main() -> Result<()> {
    let cli = Cli::parse();
    align(&cli)
}
