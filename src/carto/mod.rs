use std::collections::HashMap;

use anyhow::{Result, anyhow};
use nalgebra::DMatrix;
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};

use crate::drawing::{Drawing, Point};
use crate::validate::Validator;

/// Which soft-constraint families to add on top of the position anchors.
#[derive(Debug, Clone, Copy)]
pub struct CartogramOptions {
    pub enlarge_short_edges: bool,
    pub space_nearby_vertices: bool,
    pub add_cdt: bool,
}

impl Default for CartogramOptions {
    fn default() -> Self {
        CartogramOptions { enlarge_short_edges: true, space_nearby_vertices: true, add_cdt: true }
    }
}

const fn x_id(i: usize) -> usize {
    2 * i
}

const fn y_id(i: usize) -> usize {
    2 * i + 1
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    t * to + (1.0 - t) * from
}

fn original_delta(drawing: &Drawing, a: usize, b: usize) -> (f64, f64, f64) {
    let oa = drawing.original(a);
    let ob = drawing.original(b);
    let dx = ob.x - oa.x;
    let dy = ob.y - oa.y;
    (dx, dy, (dx * dx + dy * dy).sqrt())
}

/// Relax vertex positions by sparse least squares: anchor every vertex softly
/// to its original position, ask edges for their original (or minimally
/// enlarged) extents, and push too-near vertex pairs and short Delaunay
/// neighbors at least sqrt(2) apart. The system solves the normal equations
/// AᵀA x = Aᵀb; if the solution breaks the drawing, positions are backed off
/// linearly towards the originals until the drawing validates again.
pub fn apply_cartogram(
    drawing: &mut Drawing,
    checker: &mut Validator,
    options: &CartogramOptions,
    verbose: u8,
) -> Result<()> {
    let position_weight = 0.1;

    let edge_weight = 1.0;
    let edge_min_length = 2f64.sqrt();

    let too_near_weight = 1.0;
    let too_near_distance = 2f64.sqrt();

    let delaunay_weight = 1.0;
    let delaunay_min_length = 2f64.sqrt();

    if drawing.vertex_count() == 0 {
        return Ok(());
    }
    let num_vars = 2 * drawing.vertex_count();

    // too-near constraints
    let mut too_near: Vec<(usize, usize)> = Vec::new();
    if options.space_nearby_vertices {
        for a in 0..drawing.vertex_count() {
            for b in 0..drawing.vertex_count() {
                if a != b {
                    let (_, _, length) = original_delta(drawing, a, b);
                    if length < too_near_distance {
                        too_near.push((a, b));
                    }
                }
            }
        }
    }

    // constrained Delaunay triangulation over the current positions, with the
    // graph's edges as constraints
    let mut delaunay_cons: Vec<(usize, usize)> = Vec::new();
    if options.add_cdt {
        let mut cdt: ConstrainedDelaunayTriangulation<Point2<f64>> =
            ConstrainedDelaunayTriangulation::new();
        let mut handles = Vec::with_capacity(drawing.vertex_count());
        let mut handle_ids: HashMap<usize, usize> = HashMap::new();
        for v in 0..drawing.vertex_count() {
            let p = drawing.current(v);
            let handle = cdt
                .insert(Point2::new(p.x, p.y))
                .map_err(|e| anyhow!("cartogram triangulation rejected vertex {v}: {e}"))?;
            handle_ids.insert(handle.index(), v);
            handles.push(handle);
        }
        for edge in drawing.edges() {
            // coincident endpoints collapse to one handle; skip those
            if handles[edge.a] != handles[edge.b]
                && cdt.can_add_constraint(handles[edge.a], handles[edge.b])
            {
                cdt.add_constraint(handles[edge.a], handles[edge.b]);
            }
        }
        if verbose > 0 {
            eprintln!("[carto] Number of Delaunay points = {}", cdt.num_vertices());
        }
        for edge in cdt.undirected_edges() {
            let [p, q] = edge.vertices();
            let a = handle_ids[&p.fix().index()];
            let b = handle_ids[&q.fix().index()];
            let (_, _, length) = original_delta(drawing, a, b);
            if length < delaunay_min_length {
                delaunay_cons.push((a, b));
            }
        }
        if verbose > 0 {
            eprintln!("[carto] Number of Delaunay constraints to add = {}", delaunay_cons.len());
        }
    }

    // assemble A and b, two rows per constraint (one per axis)
    let num_rows = 2 * drawing.vertex_count()
        + 2 * drawing.edge_count()
        + 2 * too_near.len()
        + 2 * delaunay_cons.len();
    let mut coo = CooMatrix::new(num_rows, num_vars);
    let mut rhs = vec![0.0f64; num_rows];
    let mut row = 0usize;

    // position anchors
    for v in 0..drawing.vertex_count() {
        let o = drawing.original(v);
        coo.push(row, x_id(v), position_weight);
        rhs[row] = position_weight * o.x;
        row += 1;
        coo.push(row, y_id(v), position_weight);
        rhs[row] = position_weight * o.y;
        row += 1;
    }
    // edge extents
    for edge in drawing.edges() {
        let (mut dx, mut dy, length) = original_delta(drawing, edge.a, edge.b);
        if options.enlarge_short_edges && length < edge_min_length {
            dx *= edge_min_length / length;
            dy *= edge_min_length / length;
        }
        coo.push(row, x_id(edge.a), -edge_weight);
        coo.push(row, x_id(edge.b), edge_weight);
        rhs[row] = edge_weight * dx;
        row += 1;
        coo.push(row, y_id(edge.a), -edge_weight);
        coo.push(row, y_id(edge.b), edge_weight);
        rhs[row] = edge_weight * dy;
        row += 1;
    }
    // too-near spacing
    for &(a, b) in &too_near {
        let (mut dx, mut dy, length) = original_delta(drawing, a, b);
        dx *= too_near_distance / length;
        dy *= too_near_distance / length;
        coo.push(row, x_id(a), -too_near_weight);
        coo.push(row, x_id(b), too_near_weight);
        rhs[row] = too_near_weight * dx;
        row += 1;
        coo.push(row, y_id(a), -too_near_weight);
        coo.push(row, y_id(b), too_near_weight);
        rhs[row] = too_near_weight * dy;
        row += 1;
    }
    // Delaunay spacing
    for &(a, b) in &delaunay_cons {
        let (mut dx, mut dy, length) = original_delta(drawing, a, b);
        dx *= delaunay_min_length / length;
        dy *= delaunay_min_length / length;
        coo.push(row, x_id(a), -delaunay_weight);
        coo.push(row, x_id(b), delaunay_weight);
        rhs[row] = delaunay_weight * dx;
        row += 1;
        coo.push(row, y_id(a), -delaunay_weight);
        coo.push(row, y_id(b), delaunay_weight);
        rhs[row] = delaunay_weight * dy;
        row += 1;
    }

    // solve the normal equations AᵀA x = Aᵀb
    let a = CscMatrix::from(&coo);
    let at = a.transpose();
    let ata = &at * &a;
    let mut atb = DMatrix::<f64>::zeros(num_vars, 1);
    for (r, c, value) in coo.triplet_iter() {
        atb[(c, 0)] += value * rhs[r];
    }
    let factorization = CscCholesky::factor(&ata)
        .map_err(|e| anyhow!("cartogram system factorization failed: {e:?}"))?;
    let solution = factorization.solve(&atb);

    // read out the solution
    let candidate: Vec<Point> = (0..drawing.vertex_count())
        .map(|v| Point { x: solution[(x_id(v), 0)], y: solution[(y_id(v), 0)] })
        .collect();
    for v in 0..drawing.vertex_count() {
        drawing.set_current(v, candidate[v]);
    }

    // back off if the result is not topologically valid; t = 0 restores the
    // input positions exactly
    let mut t: f64 = 1.0;
    while !checker.check_full(drawing) && t > 0.0 {
        t = (t - 0.1).max(0.0);
        if verbose > 0 {
            eprintln!("[carto] Checking cartogram at time {t}");
        }
        for v in 0..drawing.vertex_count() {
            let o = drawing.original(v);
            let c = candidate[v];
            drawing.set_current(v, Point { x: lerp(o.x, c.x, t), y: lerp(o.y, c.y, t) });
        }
    }
    if verbose > 0 {
        eprintln!("[carto] Accepting cartogram at time {t}");
    }
    Ok(())
}
