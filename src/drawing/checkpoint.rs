use crate::drawing::Drawing;

impl Drawing {
    /// Run `attempt` with vertex `v` free to move; keep its effects only if it
    /// returns true. On a false return, `v`'s coordinates (and the derived
    /// rounded flag) are restored bit-exactly on every exit path.
    ///
    /// Candidate moves in the annealing and rounding phases go through here so
    /// a rejected move can never leave a half-applied state behind.
    pub fn with_rollback(&mut self, v: usize, attempt: impl FnOnce(&mut Drawing) -> bool) -> bool {
        let saved = self.current(v);
        if attempt(self) {
            true
        } else {
            self.set_current(v, saved);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::drawing::{Drawing, Point};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn bits(drawing: &Drawing) -> Vec<(u64, u64, bool)> {
        drawing
            .vertices()
            .iter()
            .map(|v| (v.current.x.to_bits(), v.current.y.to_bits(), v.is_rounded))
            .collect()
    }

    #[test]
    fn rejected_attempts_restore_bit_exactly() {
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.1, -0.0);
        drawing.add_vertex(2.75, 1e-300);
        let before = bits(&drawing);

        let kept = drawing.with_rollback(0, |d| {
            d.set_current(0, Point { x: 42.0, y: 42.0 });
            false
        });
        assert!(!kept);
        assert_eq!(bits(&drawing), before);
    }

    #[test]
    fn committed_attempts_keep_the_move() {
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.5, 0.5);

        let kept = drawing.with_rollback(0, |d| {
            d.set_current(0, Point { x: 1.0, y: 1.0 });
            true
        });
        assert!(kept);
        assert_eq!(drawing.current(0), Point { x: 1.0, y: 1.0 });
        assert!(drawing.vertex(0).is_rounded);
    }

    #[test]
    fn a_thousand_rejected_mutations_leave_no_trace() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.25, 0.75);
        drawing.add_vertex(3.0, 4.0);
        drawing.add_vertex(-1.5, 2.0);
        drawing.add_edge(0, 1);
        drawing.add_edge(1, 2);
        let before = bits(&drawing);

        for i in 0..1000 {
            let v = i % drawing.vertex_count();
            drawing.with_rollback(v, |d| {
                d.mutate(v, &mut rng);
                false
            });
        }
        assert_eq!(bits(&drawing), before);
    }
}
