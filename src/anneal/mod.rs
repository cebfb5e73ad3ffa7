mod hillclimb;

pub use hillclimb::hill_climb;

use rand::Rng;

use crate::drawing::Drawing;
use crate::progress::Progress;
use crate::validate::Validator;

/// Metropolis acceptance criterion: improvements always pass, degradations
/// pass with probability `exp(-delta / T)`.
pub fn accept_move<R: Rng + ?Sized>(
    temperature: f64,
    value: f64,
    new_value: f64,
    rng: &mut R,
) -> bool {
    if new_value < value {
        return true;
    }
    let accept_prob = (-(new_value - value) / temperature).exp();
    rng.random::<f64>() < accept_prob
}

/// Geometric cooling factor: solving alpha^steps * start = end for alpha.
pub fn exponential_schedule(start_temp: f64, end_temp: f64, steps: usize) -> f64 {
    let mut fraction = end_temp / start_temp;
    if fraction == 0.0 {
        fraction = 1.0e-6;
    }
    fraction.powf(1.0 / steps as f64)
}

/// Parameters for the quality-annealing pass.
#[derive(Debug, Clone, Copy)]
pub struct QualitySettings {
    pub steps: usize,
    pub temperature: f64,
    pub min_temperature: f64,
    pub cooling: f64,
}

impl Default for QualitySettings {
    fn default() -> Self {
        QualitySettings { steps: 10_000, temperature: 1.0, min_temperature: 0.0, cooling: 0.99 }
    }
}

/// Minimize total displacement over feasible drawings: mutate a uniformly
/// random vertex, keep the move per Metropolis, roll back otherwise. The
/// drawing must already be feasible. Returns the final score.
pub fn anneal_quality<R: Rng + ?Sized>(
    drawing: &mut Drawing,
    checker: &mut Validator,
    settings: &QualitySettings,
    rng: &mut R,
    verbose: u8,
) -> f64 {
    let mut score = drawing.rounding_cost();
    if drawing.vertex_count() == 0 {
        return score;
    }
    let mut temperature = settings.temperature;
    let mut cooling = settings.cooling;
    let mut iteration = 0usize;
    if verbose > 0 {
        eprintln!("[anneal] ================== Annealing for quality.");
    }
    let mut progress = Progress::new("Annealing ", "iterations", settings.steps, verbose > 0);

    while iteration < settings.steps {
        progress.tick(score);
        iteration += 1;
        temperature *= cooling;

        // once the temperature floor is hit, stay there
        if temperature < settings.min_temperature {
            if verbose > 0 {
                eprintln!(
                    "[anneal] Minimum temperature reached; staying at {}",
                    settings.min_temperature
                );
            }
            temperature = settings.min_temperature;
            cooling = 1.0;
        }

        let v = rng.random_range(0..drawing.vertex_count());

        // mutate the current solution, but be able to undo it
        drawing.with_rollback(v, |d| {
            d.mutate(v, rng);
            if !checker.check_after_move(d, v) {
                return false;
            }
            let new_score = d.rounding_cost();
            if accept_move(temperature, score, new_score, rng) {
                score = new_score;
                true
            } else {
                false
            }
        });
    }
    progress.done(score);
    if verbose > 0 {
        eprintln!("[anneal] ================== Annealed for {iteration} iterations.");
    }
    score
}
