use smallvec::SmallVec;

use crate::drawing::Drawing;

impl Drawing {
    /// Check that `v`'s incident edges still appear in their stored cyclic
    /// order: the angle sequence may descend at most once over the wrap, and
    /// no two incident edges may leave at the same angle.
    pub fn rotsys_ok(&self, v: usize) -> bool {
        let neighbors = &self.vertex(v).neighbors;
        if neighbors.len() <= 2 {
            return true;
        }
        let mut angles: SmallVec<[f64; 8]> =
            neighbors.iter().map(|&e| self.angle_at(v, e)).collect();
        let mut jumped = false;
        for i in 1..angles.len() {
            if angles[i - 1] > angles[i] {
                if jumped {
                    return false;
                }
                jumped = true;
            }
        }
        if angles[angles.len() - 1] > angles[0] && jumped {
            return false;
        }
        // overlapping outgoing edges share an angle exactly
        angles.sort_by(|a, b| a.total_cmp(b));
        angles.windows(2).all(|w| w[0] != w[1])
    }

    /// `rotsys_ok` for `v` and for every neighbor of `v`: the set of vertices
    /// whose angle sequences a move of `v` can change.
    pub(crate) fn neighborhood_rotsys_ok(&self, v: usize) -> bool {
        if !self.rotsys_ok(v) {
            return false;
        }
        self.vertex(v).neighbors.iter().all(|&e| self.rotsys_ok(self.edges()[e].other(v)))
    }
}

#[cfg(test)]
mod tests {
    use crate::drawing::{Drawing, Point};

    /// A hub at the origin with spokes at the given angles (unit length).
    fn star(angles: &[f64]) -> Drawing {
        let mut drawing = Drawing::new();
        let hub = drawing.add_vertex(0.0, 0.0);
        for &a in angles {
            let tip = drawing.add_vertex(a.cos(), a.sin());
            drawing.add_edge(hub, tip);
        }
        drawing.set_rotation_order();
        drawing
    }

    #[test]
    fn low_degree_vertices_are_always_valid() {
        let drawing = star(&[2.0, 0.5]);
        assert!(drawing.rotsys_ok(0));
        for tip in 1..drawing.vertex_count() {
            assert!(drawing.rotsys_ok(tip));
        }
        let lone = {
            let mut d = Drawing::new();
            d.add_vertex(3.0, 3.0);
            d
        };
        assert!(lone.rotsys_ok(0));
    }

    #[test]
    fn sorted_angles_pass() {
        let drawing = star(&[-2.0, 0.0, 1.0, 2.5]);
        assert!(drawing.rotsys_ok(0));
    }

    #[test]
    fn one_cyclic_wrap_is_allowed() {
        let mut drawing = star(&[-2.0, 0.0, 1.0, 2.0]);
        assert!(drawing.rotsys_ok(0));
        // rotate all spokes; the angle sequence becomes a cyclic shift of the
        // stored order, descending exactly once over the wrap
        let theta = 2.5f64;
        for tip in 1..drawing.vertex_count() {
            let p = drawing.current(tip);
            drawing.set_current(
                tip,
                Point {
                    x: p.x * theta.cos() - p.y * theta.sin(),
                    y: p.x * theta.sin() + p.y * theta.cos(),
                },
            );
        }
        assert!(drawing.rotsys_ok(0));
    }

    #[test]
    fn two_descents_fail() {
        let mut drawing = star(&[0.0, 1.0, 2.0, -2.0]);
        // swapping two tips' positions produces a second descent
        let p1 = drawing.current(1);
        let p2 = drawing.current(2);
        drawing.set_current(1, p2);
        drawing.set_current(2, p1);
        assert!(!drawing.rotsys_ok(0));
    }

    #[test]
    fn coincident_outgoing_edges_fail() {
        let mut drawing = star(&[0.0, 1.0, 2.0]);
        // move the third tip onto the second tip's ray, further out
        drawing.set_current(3, Point { x: 2.0 * 1.0f64.cos(), y: 2.0 * 1.0f64.sin() });
        assert!(!drawing.rotsys_ok(0));
    }

    #[test]
    fn neighborhood_check_sees_a_neighbors_violation() {
        // two hubs sharing an edge; breaking hub 0's order is visible from a
        // neighborhood check at one of its tips
        let mut drawing = Drawing::new();
        let hub = drawing.add_vertex(0.0, 0.0);
        let t1 = drawing.add_vertex(1.0, 0.0);
        let t2 = drawing.add_vertex(0.0, 1.0);
        let t3 = drawing.add_vertex(-1.0, 0.0);
        drawing.add_edge(hub, t1);
        drawing.add_edge(hub, t2);
        drawing.add_edge(hub, t3);
        drawing.set_rotation_order();

        let p1 = drawing.current(t1);
        let p3 = drawing.current(t3);
        drawing.set_current(t1, p3);
        drawing.set_current(t3, p1);
        assert!(!drawing.rotsys_ok(hub));
        assert!(!drawing.neighborhood_rotsys_ok(t2));
        assert!(drawing.rotsys_ok(t2));
    }
}
