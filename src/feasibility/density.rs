use std::collections::HashMap;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::anneal::accept_move;
use crate::drawing::Drawing;
use crate::feasibility::greedy::attempt_greedy;
use crate::progress::Progress;
use crate::validate::Validator;

/// A scalar score over the current drawing. Evaluators also refresh each
/// vertex's `density` scratch field, which the annealer uses as a sampling
/// weight.
pub trait ScoreFunction {
    fn evaluate(&self, drawing: &mut Drawing) -> f64;
}

/// O(n²) sum of 1/dist² over all vertex pairs; each vertex keeps the share
/// contributed by its pairs with higher-numbered vertices.
pub struct ContinuousDensity;

impl ScoreFunction for ContinuousDensity {
    fn evaluate(&self, drawing: &mut Drawing) -> f64 {
        let n = drawing.vertex_count();
        let mut score = 0.0;
        for i in 0..n.saturating_sub(1) {
            let mut local = 0.0;
            for j in i + 1..n {
                local += 1.0 / drawing.distance_sqr(i, j);
            }
            drawing.set_density(i, local);
            score += local;
        }
        score
    }
}

fn cell_of(x: f64, y: f64) -> (i64, i64) {
    (x.round() as i64, y.round() as i64)
}

/// Per-cell occupancy counts: a rounded vertex spreads 1/9 over its 3×3
/// neighborhood, a fractional vertex 1/4 over the corners of its unit cell.
/// Each vertex scores the squared count of its own (rounded) cell.
pub struct GridDensity;

impl ScoreFunction for GridDensity {
    fn evaluate(&self, drawing: &mut Drawing) -> f64 {
        let mut cells: HashMap<(i64, i64), f64> = HashMap::new();
        for vertex in drawing.vertices() {
            let p = vertex.current;
            if vertex.is_rounded {
                let (cx, cy) = (p.x as i64, p.y as i64);
                for x in cx - 1..=cx + 1 {
                    for y in cy - 1..=cy + 1 {
                        *cells.entry((x, y)).or_insert(0.0) += 1.0 / 9.0;
                    }
                }
            } else {
                for x in [p.x.floor(), p.x.ceil()] {
                    for y in [p.y.floor(), p.y.ceil()] {
                        *cells.entry(cell_of(x, y)).or_insert(0.0) += 1.0 / 4.0;
                    }
                }
            }
        }
        let mut score = 0.0;
        for v in 0..drawing.vertex_count() {
            let p = drawing.current(v);
            let here = cells.get(&cell_of(p.x, p.y)).copied().unwrap_or(0.0);
            let local = here * here;
            drawing.set_density(v, local);
            score += local;
        }
        score
    }
}

/// Total displacement from the input positions; each vertex's own
/// displacement doubles as its sampling weight.
pub struct RoundingCost;

impl ScoreFunction for RoundingCost {
    fn evaluate(&self, drawing: &mut Drawing) -> f64 {
        let mut score = 0.0;
        for v in 0..drawing.vertex_count() {
            let cost = drawing.rounding_cost_of(v);
            drawing.set_density(v, cost);
            score += cost;
        }
        score
    }
}

/// Drive every vertex onto the integer grid by weighted random mutation with
/// density-guided acceptance, falling back to greedy rounding whenever it
/// applies. Returns as soon as the drawing is feasible; running out of the
/// iteration budget leaves a drawing that is valid but not all-integer.
pub fn density_annealing<R: Rng + ?Sized>(
    drawing: &mut Drawing,
    checker: &mut Validator,
    score_fn: &dyn ScoreFunction,
    rng: &mut R,
    max_iterations: usize,
    verbose: u8,
) {
    let mut temperature = 1.0f64;
    let cooling = 1.0f64; // rounding opportunism does the work; cooling stays off
    let mut num_rounded = drawing.num_rounded();
    if num_rounded == drawing.vertex_count() {
        if verbose > 0 {
            eprintln!("[feasibility] Input already was a feasible drawing.");
        }
        return;
    }

    let mut score = score_fn.evaluate(drawing);
    let mut iteration = 0usize;
    if verbose > 0 {
        eprintln!("[feasibility] ================== Annealing for feasibility.");
    }
    let mut progress = Progress::new("Annealing ", "iterations", 0, verbose > 0);
    let mut weights = vec![0.0f64; drawing.vertex_count()];

    while iteration < max_iterations {
        progress.tick(num_rounded as f64);
        iteration += 1;
        temperature *= cooling;

        // attempt greedy on each unrounded vertex
        let mut greedy_changed_something = false;
        for v in 0..drawing.vertex_count() {
            if !drawing.vertex(v).is_rounded && attempt_greedy(drawing, checker, v) {
                num_rounded += 1;
                greedy_changed_something = true;
            }
        }
        if greedy_changed_something {
            score = score_fn.evaluate(drawing);
        }
        // we are done if all vertices are feasible
        if num_rounded == drawing.vertex_count() {
            progress.done(num_rounded as f64);
            if verbose > 0 {
                eprintln!(
                    "[feasibility] ================== Found feasible drawing by greedy after {iteration} iterations."
                );
            }
            return;
        }

        // pick a random vertex, density-weighted; unrounded vertices count
        // tenfold, and on odd iterations rounded ones are excluded outright
        for (i, vertex) in drawing.vertices().iter().enumerate() {
            weights[i] = vertex.density;
            if !vertex.is_rounded {
                weights[i] *= 10.0;
            } else if iteration % 2 == 1 {
                weights[i] = 0.0;
            }
        }
        let v = match WeightedIndex::new(weights.iter().copied()) {
            Ok(distribution) => distribution.sample(rng),
            Err(_) => {
                // every weight vanished; fall back to a uniform unrounded choice
                let unrounded: Vec<usize> = (0..drawing.vertex_count())
                    .filter(|&u| !drawing.vertex(u).is_rounded)
                    .collect();
                unrounded[rng.random_range(0..unrounded.len())]
            }
        };

        // mutate the current solution, but be able to undo it
        let was_rounded = drawing.vertex(v).is_rounded;
        let mut just_rounded = false;
        drawing.with_rollback(v, |d| {
            d.mutate(v, rng);
            if !checker.check_after_move(d, v) {
                return false;
            }
            let new_score = score_fn.evaluate(d);
            if !was_rounded && d.vertex(v).is_rounded {
                // always accept if we round a vertex
                just_rounded = true;
                score = new_score;
                return true;
            }
            if accept_move(temperature, score, new_score, rng) {
                score = new_score;
                true
            } else {
                false
            }
        });
        if just_rounded {
            num_rounded += 1;
            if num_rounded == drawing.vertex_count() {
                progress.done(num_rounded as f64);
                if verbose > 0 {
                    eprintln!("[feasibility] Found feasible drawing in {iteration} iterations.");
                }
                return;
            }
        }
    }
    progress.done(num_rounded as f64);
    eprintln!(
        "[feasibility] Density annealing failed to find a feasible solution after {max_iterations} iterations; things are going to be bad."
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::Point;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn half_grid_square() -> Drawing {
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.5, 0.5);
        drawing.add_vertex(1.5, 0.5);
        drawing.add_vertex(1.5, 1.5);
        drawing.add_vertex(0.5, 1.5);
        drawing.add_edge(0, 1);
        drawing.add_edge(1, 2);
        drawing.add_edge(2, 3);
        drawing.add_edge(3, 0);
        drawing.set_rotation_order();
        drawing
    }

    #[test]
    fn continuous_density_sums_inverse_square_distances() {
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.0, 0.0);
        drawing.add_vertex(2.0, 0.0);
        drawing.add_vertex(0.0, 2.0);
        let score = ContinuousDensity.evaluate(&mut drawing);
        // pairs: d²=4, d²=4, d²=8
        assert!((score - (0.25 + 0.25 + 0.125)).abs() < 1e-12);
        assert!((drawing.vertex(0).density - 0.5).abs() < 1e-12);
        assert!((drawing.vertex(1).density - 0.125).abs() < 1e-12);
    }

    #[test]
    fn grid_density_counts_cell_occupancy() {
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.0, 0.0);
        let score = GridDensity.evaluate(&mut drawing);
        // a lone rounded vertex sees only its own ninth, squared
        assert!((score - 1.0 / 81.0).abs() < 1e-12);

        let mut pair = Drawing::new();
        pair.add_vertex(0.0, 0.0);
        pair.add_vertex(0.5, 0.5);
        let score = GridDensity.evaluate(&mut pair);
        // cell (0,0): 1/9 from the rounded vertex + 1/4 from the fractional
        // one; the fractional vertex rounds to (1, 1) which holds 1/9 + 1/4
        let at_origin: f64 = 1.0 / 9.0 + 0.25;
        assert!((score - 2.0 * at_origin * at_origin).abs() < 1e-12);
    }

    #[test]
    fn rounding_cost_writes_per_vertex_densities() {
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.0, 0.0);
        drawing.add_vertex(1.0, 1.0);
        drawing.set_current(0, Point { x: 3.0, y: 4.0 });
        let score = RoundingCost.evaluate(&mut drawing);
        assert_eq!(score, 5.0);
        assert_eq!(drawing.vertex(0).density, 5.0);
        assert_eq!(drawing.vertex(1).density, 0.0);
    }

    #[test]
    fn density_annealing_rounds_the_half_grid_square() {
        for (label, score_fn) in [
            ("anneal", &ContinuousDensity as &dyn ScoreFunction),
            ("grid", &GridDensity),
            ("cost", &RoundingCost),
        ] {
            let mut drawing = half_grid_square();
            let mut checker = Validator::new();
            let mut rng = StdRng::seed_from_u64(0);
            density_annealing(&mut drawing, &mut checker, score_fn, &mut rng, 100_000, 0);
            assert_eq!(drawing.num_rounded(), 4, "score function {label}");
            assert!(checker.check_full(&drawing), "score function {label}");
        }
    }

    #[test]
    fn density_annealing_is_a_noop_on_feasible_input() {
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.0, 0.0);
        drawing.add_vertex(2.0, 0.0);
        drawing.add_edge(0, 1);
        drawing.set_rotation_order();
        let before = drawing.positions();

        let mut checker = Validator::new();
        let mut rng = StdRng::seed_from_u64(0);
        density_annealing(&mut drawing, &mut checker, &ContinuousDensity, &mut rng, 1000, 0);
        assert_eq!(drawing.positions(), before);
    }

    #[test]
    fn budget_exhaustion_returns_without_feasibility() {
        // five coincident vertices: the unit cell has only four corners, so
        // one vertex cannot round within a single iteration
        let mut drawing = Drawing::new();
        for _ in 0..5 {
            drawing.add_vertex(0.5, 0.5);
        }
        let mut checker = Validator::new();
        let mut rng = StdRng::seed_from_u64(0);
        density_annealing(&mut drawing, &mut checker, &GridDensity, &mut rng, 1, 0);
        assert_eq!(drawing.num_rounded(), 4);
    }
}
