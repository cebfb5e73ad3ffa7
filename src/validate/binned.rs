use geo::algorithm::line_intersection::line_intersection;
use geo::{Coord, Line};

use crate::drawing::{Drawing, Point};

const W: usize = 512;

/// Planarity checker with a binned broad phase.
///
/// Every edge is rasterized into a `W`×`W` bin grid spanning the drawing's
/// bounding box; only edges sharing a bin are tested pairwise. The bins a
/// segment touches are a superset of the bins it truly crosses, so the
/// per-bin exact test is authoritative. The bin buffer is scratch state and
/// must not be shared between concurrent validations.
pub struct Validator {
    bins: Vec<Vec<usize>>,
    min: Point,
    max: Point,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Validator { bins: vec![Vec::new(); W * W], min: Point::default(), max: Point::default() }
    }

    /// True iff no other rounded vertex sits exactly on `v`'s coordinates.
    pub fn vertex_overlap_ok(drawing: &Drawing, v: usize) -> bool {
        let p = drawing.current(v);
        drawing
            .vertices()
            .iter()
            .enumerate()
            .all(|(u, w)| u == v || !w.is_rounded || w.current.x != p.x || w.current.y != p.y)
    }

    /// True iff no two non-adjacent edge segments share a point.
    pub fn check_intersections(&mut self, drawing: &Drawing) -> bool {
        let Some((min, max)) = drawing.bounds() else {
            return true;
        };
        self.min = min;
        self.max = max;
        for bin in &mut self.bins {
            bin.clear();
        }
        for e in 0..drawing.edge_count() {
            self.rasterize_edge(drawing, e);
        }
        self.bins.iter().all(|bin| Self::check_bin(drawing, bin))
    }

    /// Complete validation: overlap and rotation-system checks for every
    /// vertex, then the global intersection test.
    pub fn check_full(&mut self, drawing: &Drawing) -> bool {
        for v in 0..drawing.vertex_count() {
            if !Self::vertex_overlap_ok(drawing, v) {
                return false;
            }
            if !drawing.rotsys_ok(v) {
                return false;
            }
        }
        self.check_intersections(drawing)
    }

    /// Validation after moving only `v`: overlap of `v`, rotation systems of
    /// `v` and its neighbors, then the global intersection test.
    pub fn check_after_move(&mut self, drawing: &Drawing, v: usize) -> bool {
        if !Self::vertex_overlap_ok(drawing, v) {
            return false;
        }
        if !drawing.neighborhood_rotsys_ok(v) {
            return false;
        }
        self.check_intersections(drawing)
    }

    /// Brute-force pairwise test of the edges in one bin, skipping pairs that
    /// share an endpoint.
    fn check_bin(drawing: &Drawing, bin: &[usize]) -> bool {
        for (i, &ei) in bin.iter().enumerate() {
            let e = drawing.edges()[ei];
            let seg = Self::segment(drawing, ei);
            for &ej in &bin[i + 1..] {
                let f = drawing.edges()[ej];
                if e.a == f.a || e.a == f.b || e.b == f.a || e.b == f.b {
                    continue;
                }
                if line_intersection(seg, Self::segment(drawing, ej)).is_some() {
                    return false;
                }
            }
        }
        true
    }

    fn segment(drawing: &Drawing, e: usize) -> Line<f64> {
        let edge = drawing.edges()[e];
        let a = drawing.current(edge.a);
        let b = drawing.current(edge.b);
        Line::new(Coord { x: a.x, y: a.y }, Coord { x: b.x, y: b.y })
    }

    /// Map a coordinate into bin space: the box interior spans `[1, W-1]`.
    fn bin_coord(value: f64, min: f64, max: f64) -> f64 {
        let unit = if max > min { (value - min) / (max - min) } else { 0.0 };
        (W as f64 - 2.0) * unit + 1.0
    }

    /// Scanline walk of one segment through the bin grid, appending the edge
    /// id to every bin it touches.
    fn rasterize_edge(&mut self, drawing: &Drawing, e: usize) {
        let edge = drawing.edges()[e];
        let pa = drawing.current(edge.a);
        let pb = drawing.current(edge.b);
        let mut x0 = Self::bin_coord(pa.x, self.min.x, self.max.x);
        let mut y0 = Self::bin_coord(pa.y, self.min.y, self.max.y);
        let mut x1 = Self::bin_coord(pb.x, self.min.x, self.max.x);
        let mut y1 = Self::bin_coord(pb.y, self.min.y, self.max.y);

        if x0 == x1 {
            // vertical
            let ix = x0.floor() as i64;
            let (lo, hi) = if y0 < y1 { (y0, y1) } else { (y1, y0) };
            let mut i = lo.floor() as i64;
            while i as f64 <= hi {
                self.mark(ix, i, e);
                i += 1;
            }
            return;
        }

        if x0 > x1 {
            // walk left to right
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }
        // line equation y = m*x + b
        let m = (y0 - y1) / (x0 - x1);
        let b = (x0 * y1 - x1 * y0) / (x0 - x1);
        let mut ix0 = x0.floor() as i64;
        let mut iy0 = y0.floor() as i64;
        if m.abs() < 1.0e-14 {
            // near-horizontal
            let mut i = ix0;
            while i as f64 <= x1 {
                self.mark(i, iy0, e);
                i += 1;
            }
        } else if y0 < y1 {
            // ascending
            let mut y = m * (ix0 + 1) as f64 + b;
            while ix0 as f64 <= x1 - 1.0 {
                let mut i = iy0;
                while (i as f64) < y {
                    self.mark(ix0, i, e);
                    i += 1;
                }
                iy0 = y.floor() as i64;
                ix0 += 1;
                y += m; // in effect: y = m*(ix0+1) + b
            }
            let mut i = iy0;
            while i as f64 <= y1 {
                self.mark(ix0, i, e);
                i += 1;
            }
        } else {
            // descending
            let mut y = m * (ix0 + 1) as f64 + b;
            while ix0 as f64 <= x1 - 1.0 {
                let mut i = iy0;
                while i as f64 > y - 1.0 {
                    self.mark(ix0, i, e);
                    i -= 1;
                }
                iy0 = y.floor() as i64;
                ix0 += 1;
                y += m;
            }
            let mut i = iy0;
            while i as f64 > y1 - 1.0 {
                self.mark(ix0, i, e);
                i -= 1;
            }
        }
    }

    fn mark(&mut self, x: i64, y: i64, e: usize) {
        // finite inputs land in [1, W-1]; the clamp keeps degenerate boxes in range
        let x = x.clamp(0, W as i64 - 1) as usize;
        let y = y.clamp(0, W as i64 - 1) as usize;
        self.bins[y * W + x].push(e);
    }
}
