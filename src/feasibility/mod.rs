mod density;
mod greedy;

pub use density::{
    ContinuousDensity, GridDensity, RoundingCost, ScoreFunction, density_annealing,
};
pub use greedy::{attempt_greedy, scale_and_greedy, scale_and_round};
