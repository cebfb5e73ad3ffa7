use std::io::Write;
use std::path::Path;

use anyhow::{Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::anneal::{QualitySettings, anneal_quality, exponential_schedule, hill_climb};
use crate::carto::{CartogramOptions, apply_cartogram};
use crate::cli::{Cli, Feasibility};
use crate::feasibility::{
    ContinuousDensity, GridDensity, RoundingCost, density_annealing, scale_and_greedy,
    scale_and_round,
};
use crate::io::{load_agf, load_shapefile, write_agf, write_agf_file, write_report};
use crate::validate::Validator;

/// The whole pipeline: load, normalize, preprocess, make feasible, anneal for
/// quality, polish, and write the result.
pub fn align(cli: &Cli) -> Result<()> {
    let verbose = cli.verbose;

    // load, by extension
    let extension = cli.input.extension().and_then(|e| e.to_str()).unwrap_or("");
    let mut drawing = match extension {
        "shp" => load_shapefile(&cli.input, verbose)?,
        "agf" => load_agf(&cli.input, verbose)?,
        _ => bail!("unrecognized input extension on '{}'; expected .shp or .agf", cli.input.display()),
    };

    // normalize
    if !cli.nocenter {
        if let Some(old_center) = drawing.center() {
            if verbose > 0 {
                eprintln!(
                    "[align] Centering input graph (old center was: {} {})",
                    old_center.x, old_center.y
                );
            }
        }
    }
    if let Some(grid) = cli.grid {
        drawing.fit_to_grid(grid);
    }

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let mut checker = Validator::new();

    // fix the embedding, then diagnose the input
    if verbose > 0 {
        eprintln!("[align] Setting up embeddings...");
    }
    drawing.set_rotation_order();

    if verbose > 0 {
        eprintln!("[align] Testing every rotation system...");
    }
    if (0..drawing.vertex_count()).any(|v| !drawing.rotsys_ok(v)) {
        eprintln!("[align] Input does not pass the rotation-system check. Things are going to be bad.");
    }
    if verbose > 0 {
        eprintln!("[align] Testing for intersections...");
    }
    if !checker.check_intersections(&drawing) {
        eprintln!("[align] Input does not pass the geometry check. Things are going to be bad.");
    }

    // optional linear cartogram preprocess
    if cli.carto {
        if verbose > 0 {
            eprintln!("[align] Applying linear cartogram...");
        }
        if let Err(error) =
            apply_cartogram(&mut drawing, &mut checker, &CartogramOptions::default(), verbose)
        {
            eprintln!("[align] Cartogram preprocess failed: {error:#}. Continuing with the input drawing.");
        }
        if !checker.check_full(&drawing) {
            eprintln!("[align] Drawing no longer valid after cartogram. Things are going to be bad.");
        }
    }
    let positions_after_preprocessing = drawing.positions();

    // turn the input into SOME grid drawing
    match cli.feasibility {
        Some(Feasibility::Round) => {
            if verbose > 0 {
                eprintln!("[align] Feasibility method: rounding coordinates.");
            }
            scale_and_round(&mut drawing, &mut checker, verbose);
        }
        Some(Feasibility::Greedy) => {
            if verbose > 0 {
                eprintln!("[align] Feasibility method: greedy heuristic.");
            }
            scale_and_greedy(&mut drawing, &mut checker, verbose);
        }
        Some(Feasibility::Anneal) => {
            if verbose > 0 {
                eprintln!("[align] Feasibility method: annealing with continuous density.");
            }
            density_annealing(&mut drawing, &mut checker, &ContinuousDensity, &mut rng, usize::MAX, verbose);
        }
        Some(Feasibility::Grid) => {
            if verbose > 0 {
                eprintln!("[align] Feasibility method: annealing with grid density.");
            }
            density_annealing(&mut drawing, &mut checker, &GridDensity, &mut rng, usize::MAX, verbose);
        }
        Some(Feasibility::Cost) => {
            if verbose > 0 {
                eprintln!("[align] Feasibility method: annealing with the rounding cost.");
            }
            density_annealing(&mut drawing, &mut checker, &RoundingCost, &mut rng, usize::MAX, verbose);
        }
        Some(Feasibility::None) => {
            if verbose > 0 {
                eprintln!("[align] Feasibility method: none. Input drawing should be feasible.");
            }
        }
        None => {
            eprintln!("[align] No feasibility method indicated; things will be bad if the input is not feasible.");
        }
    }
    let positions_first_feasible = drawing.positions();
    if verbose > 0 && drawing.vertex_count() > 0 {
        eprintln!(
            "[align] Average cost per vertex: {}",
            drawing.rounding_cost() / drawing.vertex_count() as f64
        );
    }
    if cli.dump {
        write_agf_file(&drawing, Path::new("feasible.agf"))?;
    }

    // sanity check: is the "ensured feasible" drawing actually valid?
    if (0..drawing.vertex_count()).any(|v| !drawing.rotsys_ok(v)) {
        eprintln!(
            "[align] Supposedly feasible drawing does not pass the rotation-system check. Things are going to be bad."
        );
    }
    if !checker.check_intersections(&drawing) {
        eprintln!(
            "[align] Supposedly feasible drawing does not pass the geometry check. Things are going to be bad."
        );
    }

    // anneal for quality
    let cooling = if cli.autocool {
        let derived = exponential_schedule(cli.temp, cli.mintemp, cli.steps);
        if verbose > 0 {
            eprintln!(
                "[align] Setting cooling schedule from {} to {} in {} steps (factor {})",
                cli.temp, cli.mintemp, cli.steps, derived
            );
        }
        derived
    } else {
        cli.cooling
    };
    let settings = QualitySettings {
        steps: cli.steps,
        temperature: cli.temp,
        min_temperature: cli.mintemp,
        cooling,
    };
    let mut score = anneal_quality(&mut drawing, &mut checker, &settings, &mut rng, verbose);
    let positions_after_annealing = drawing.positions();
    if verbose > 0 && drawing.vertex_count() > 0 {
        eprintln!("[align] Average cost per vertex: {}", score / drawing.vertex_count() as f64);
    }

    // hillclimb to a local optimum
    if cli.hillclimb {
        if verbose > 0 {
            eprintln!("[align] ================== Hillclimbing for quality.");
        }
        let rounds = hill_climb(&mut drawing, &mut checker, verbose);
        score = drawing.rounding_cost();
        if verbose > 0 {
            eprintln!("[align] ================== Hillclimbed for {rounds} rounds.");
        }
    }
    if verbose > 0 && drawing.vertex_count() > 0 {
        eprintln!(
            "[align] Final average cost per vertex: {}",
            score / drawing.vertex_count() as f64
        );
    }

    // persist the result
    match &cli.output {
        Some(path) => write_agf_file(&drawing, path)?,
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_agf(&drawing, &mut lock)?;
            lock.flush()?;
        }
    }
    write_report(
        &drawing,
        &positions_after_preprocessing,
        &positions_first_feasible,
        &positions_after_annealing,
        Path::new("output.svg"),
        verbose,
    )?;
    Ok(())
}
