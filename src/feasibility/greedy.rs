use crate::drawing::{Drawing, Point};
use crate::validate::Validator;

/// The grid-adjacent integer on the other side of `x`.
fn round_away(x: f64) -> f64 {
    if x < x.round() { x.floor() } else { x.ceil() }
}

fn attempt_move(drawing: &mut Drawing, checker: &mut Validator, v: usize, x: f64, y: f64) -> bool {
    drawing.with_rollback(v, |d| {
        d.set_current(v, Point { x, y });
        checker.check_after_move(d, v)
    })
}

/// Try to put `v` on a grid point without breaking the drawing: nearest
/// corner first, then the two grid-adjacent alternatives (dominant axis
/// first), then the diagonal. Failed attempts roll back; on success `v` is
/// rounded and the drawing is still valid.
pub fn attempt_greedy(drawing: &mut Drawing, checker: &mut Validator, v: usize) -> bool {
    let p = drawing.current(v);
    // rounding is cheapest
    if attempt_move(drawing, checker, v, p.x.round(), p.y.round()) {
        return true;
    }
    // try grid-adjacent positions
    let dx = (p.x - p.x.round()).abs();
    let dy = (p.y - p.y.round()).abs();
    if dx >= dy {
        if attempt_move(drawing, checker, v, round_away(p.x), p.y.round()) {
            return true;
        }
        if attempt_move(drawing, checker, v, p.x.round(), round_away(p.y)) {
            return true;
        }
    } else {
        if attempt_move(drawing, checker, v, p.x.round(), round_away(p.y)) {
            return true;
        }
        if attempt_move(drawing, checker, v, round_away(p.x), p.y.round()) {
            return true;
        }
    }
    // try the diagonal grid point
    attempt_move(drawing, checker, v, round_away(p.x), round_away(p.y))
}

/// Blow the drawing up by integer factors until greedy rounding succeeds for
/// every vertex in id order. Terminates once the drawing is sparse enough.
pub fn scale_and_greedy(drawing: &mut Drawing, checker: &mut Validator, verbose: u8) {
    if verbose > 0 {
        eprintln!("[feasibility] Running scale-and-greedy...");
    }
    let mut factor = 0.0;
    loop {
        factor += 1.0;
        if verbose > 0 {
            eprintln!("[feasibility] Scale-and-greedy trying factor {factor}...");
        }
        // scale everybody
        for v in 0..drawing.vertex_count() {
            let o = drawing.original(v);
            drawing.set_current(v, Point { x: factor * o.x, y: factor * o.y });
        }
        // round vertices one by one
        let mut done = true;
        for v in 0..drawing.vertex_count() {
            if !attempt_greedy(drawing, checker, v) {
                done = false;
                break;
            }
        }
        if done {
            break;
        }
    }
    drawing.refresh_rounded_all();
    if verbose > 0 {
        eprintln!("[feasibility] Scale-and-greedy successful.");
    }
}

/// The blunt cousin: scale by integer factors and round everything at once,
/// until the result validates as a whole.
pub fn scale_and_round(drawing: &mut Drawing, checker: &mut Validator, verbose: u8) {
    if verbose > 0 {
        eprintln!("[feasibility] Running scale-and-round...");
    }
    let mut factor = 0.0;
    loop {
        factor += 1.0;
        if verbose > 0 {
            eprintln!("[feasibility] Scale-and-round trying factor {factor}...");
        }
        for v in 0..drawing.vertex_count() {
            let o = drawing.original(v);
            drawing
                .set_current(v, Point { x: (factor * o.x).round(), y: (factor * o.y).round() });
        }
        if checker.check_full(drawing) {
            break;
        }
    }
    drawing.refresh_rounded_all();
    if verbose > 0 {
        eprintln!("[feasibility] Scale-and-round successful.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_rounds_to_the_nearest_free_corner() {
        let mut drawing = Drawing::new();
        let v = drawing.add_vertex(1.2, 2.8);
        let mut checker = Validator::new();
        assert!(attempt_greedy(&mut drawing, &mut checker, v));
        assert_eq!(drawing.current(v), Point { x: 1.0, y: 3.0 });
        assert!(drawing.vertex(v).is_rounded);
    }

    #[test]
    fn greedy_falls_back_when_the_nearest_corner_is_taken() {
        let mut drawing = Drawing::new();
        drawing.add_vertex(1.0, 3.0);
        let v = drawing.add_vertex(1.2, 2.8);
        let mut checker = Validator::new();
        assert!(attempt_greedy(&mut drawing, &mut checker, v));
        // x is the dominant fractional axis, so (2, 3) is tried first
        assert_eq!(drawing.current(v), Point { x: 2.0, y: 3.0 });
    }

    #[test]
    fn greedy_failure_leaves_the_drawing_bit_identical() {
        let mut drawing = Drawing::new();
        // all four corners of the unit cell around (0.5, 0.5) are occupied
        drawing.add_vertex(0.0, 0.0);
        drawing.add_vertex(1.0, 0.0);
        drawing.add_vertex(0.0, 1.0);
        drawing.add_vertex(1.0, 1.0);
        let v = drawing.add_vertex(0.5, 0.5);
        let before: Vec<(u64, u64)> = drawing
            .vertices()
            .iter()
            .map(|w| (w.current.x.to_bits(), w.current.y.to_bits()))
            .collect();

        let mut checker = Validator::new();
        assert!(!attempt_greedy(&mut drawing, &mut checker, v));
        let after: Vec<(u64, u64)> = drawing
            .vertices()
            .iter()
            .map(|w| (w.current.x.to_bits(), w.current.y.to_bits()))
            .collect();
        assert_eq!(before, after);
        assert!(!drawing.vertex(v).is_rounded);
    }

    #[test]
    fn scale_and_greedy_rounds_the_half_grid_square() {
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

        let mut checker = Validator::new();
        scale_and_greedy(&mut drawing, &mut checker, 0);
        assert_eq!(drawing.num_rounded(), 4);
        assert!(checker.check_full(&drawing));
        // every vertex stays within its own unit cell
        for v in drawing.vertices() {
            assert!((v.current.x - v.original.x).abs() <= 0.5);
            assert!((v.current.y - v.original.y).abs() <= 0.5);
        }
    }

    #[test]
    fn scale_and_round_needs_factor_two_for_the_narrow_path() {
        // at factor 1 the middle vertex rounds onto (0, 1), collapsing an edge
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.0, 0.0);
        drawing.add_vertex(0.25, 0.6);
        drawing.add_vertex(0.0, 1.2);
        drawing.add_edge(0, 1);
        drawing.add_edge(1, 2);
        drawing.set_rotation_order();

        let mut checker = Validator::new();
        scale_and_round(&mut drawing, &mut checker, 0);
        assert_eq!(drawing.num_rounded(), 3);
        assert!(checker.check_full(&drawing));
        // the factor-2 rendition: round(2 * original)
        assert_eq!(drawing.current(0), Point { x: 0.0, y: 0.0 });
        assert_eq!(drawing.current(1), Point { x: 1.0, y: 1.0 });
        assert_eq!(drawing.current(2), Point { x: 0.0, y: 2.0 });
    }

    #[test]
    fn scale_ops_accept_an_already_integer_drawing_at_factor_one() {
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.0, 0.0);
        drawing.add_vertex(3.0, 0.0);
        drawing.add_edge(0, 1);
        drawing.set_rotation_order();
        let mut checker = Validator::new();
        scale_and_round(&mut drawing, &mut checker, 0);
        assert_eq!(drawing.current(1), Point { x: 3.0, y: 0.0 });
    }
}
