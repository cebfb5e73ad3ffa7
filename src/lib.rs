#![doc = "Gridalign public API"]

mod anneal;
mod carto;
mod drawing;
mod feasibility;
mod io;
mod progress;
mod validate;

pub mod cli;
pub mod commands;

#[doc(inline)]
pub use drawing::{Drawing, Edge, Point, Vertex};

#[doc(inline)]
pub use validate::Validator;

#[doc(inline)]
pub use feasibility::{
    ContinuousDensity, GridDensity, RoundingCost, ScoreFunction, attempt_greedy,
    density_annealing, scale_and_greedy, scale_and_round,
};

#[doc(inline)]
pub use anneal::{QualitySettings, accept_move, anneal_quality, exponential_schedule, hill_climb};

#[doc(inline)]
pub use carto::{CartogramOptions, apply_cartogram};

#[doc(inline)]
pub use io::{load_agf, load_shapefile, write_agf, write_agf_file, write_report};
