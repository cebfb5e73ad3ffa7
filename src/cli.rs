use clap::{Parser, ValueEnum, ValueHint};
use std::path::PathBuf;

/// Grid-alignment CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "gridalign", version, about)]
pub struct Cli {
    /// Input drawing: a .shp or .agf file
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Feasibility method
    #[arg(short = 'f', long, value_enum)]
    pub feasibility: Option<Feasibility>,

    /// Preprocess with the linear cartogram
    #[arg(long)]
    pub carto: bool,

    /// Number of steps for quality annealing
    #[arg(short = 'm', long, default_value_t = 10_000)]
    pub steps: usize,

    /// Initial temperature for quality annealing
    #[arg(short = 't', long, default_value_t = 1.0)]
    pub temp: f64,

    /// Minimum temperature for quality annealing
    #[arg(long, default_value_t = 0.0)]
    pub mintemp: f64,

    /// Cooling factor during quality annealing
    #[arg(short = 'c', long, default_value_t = 0.99)]
    pub cooling: f64,

    /// Pick the cooling factor such that cooling^steps * temp = mintemp
    #[arg(long)]
    pub autocool: bool,

    /// Scale the input to fit this grid size
    #[arg(short = 'g', long)]
    pub grid: Option<u32>,

    /// Apply hill climbing after quality annealing
    #[arg(long)]
    pub hillclimb: bool,

    /// Do not center the input network
    #[arg(long)]
    pub nocenter: bool,

    /// Output filename, otherwise to stdout
    #[arg(short = 'o', long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Write the intermediate feasible drawing to feasible.agf
    #[arg(short = 'd', long)]
    pub dump: bool,

    /// Seed for the random generator
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum Feasibility {
    /// Scale and round all coordinates at once
    Round,
    /// Scale and greedily round vertex by vertex
    Greedy,
    /// Density annealing with the continuous density score
    Anneal,
    /// Density annealing with the grid density score
    Grid,
    /// Density annealing with the rounding-cost score
    Cost,
    /// The input drawing is assumed feasible already
    None,
}
