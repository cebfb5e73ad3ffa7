use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use shapefile::Shape;

use crate::drawing::Drawing;

/// Load the line work of a shapefile as a drawing. Identical coordinates are
/// merged into one vertex, zero-length segments are skipped, and duplicate
/// edges are rejected by the edge factory.
pub fn load_shapefile(path: &Path, verbose: u8) -> Result<Drawing> {
    if verbose > 0 {
        eprintln!("[load] Loading shapefile...");
    }
    let shapes = shapefile::read_shapes(path)
        .with_context(|| format!("failed to open shapefile '{}'", path.display()))?;
    if verbose > 0 {
        eprintln!("[load] Number of entities: {}", shapes.len());
    }

    let mut drawing = Drawing::new();
    let mut seen: HashMap<(u64, u64), usize> = HashMap::new();
    let mut skipped = 0usize;
    for shape in shapes {
        match shape {
            Shape::Polyline(line) => {
                for part in line.parts() {
                    add_stroke(&mut drawing, &mut seen, part.iter().map(|p| (p.x, p.y)), &mut skipped);
                }
            }
            Shape::PolylineM(line) => {
                for part in line.parts() {
                    add_stroke(&mut drawing, &mut seen, part.iter().map(|p| (p.x, p.y)), &mut skipped);
                }
            }
            Shape::PolylineZ(line) => {
                for part in line.parts() {
                    add_stroke(&mut drawing, &mut seen, part.iter().map(|p| (p.x, p.y)), &mut skipped);
                }
            }
            Shape::Polygon(polygon) => {
                for ring in polygon.rings() {
                    add_stroke(&mut drawing, &mut seen, ring.points().iter().map(|p| (p.x, p.y)), &mut skipped);
                }
            }
            Shape::PolygonM(polygon) => {
                for ring in polygon.rings() {
                    add_stroke(&mut drawing, &mut seen, ring.points().iter().map(|p| (p.x, p.y)), &mut skipped);
                }
            }
            Shape::PolygonZ(polygon) => {
                for ring in polygon.rings() {
                    add_stroke(&mut drawing, &mut seen, ring.points().iter().map(|p| (p.x, p.y)), &mut skipped);
                }
            }
            other => bail!(
                "unsupported shape type {} in '{}'; expected line work",
                other.shapetype(),
                path.display()
            ),
        }
    }

    if verbose > 0 {
        eprintln!("[load] Number of points: {}", drawing.vertex_count());
        eprintln!("[load] Number of edges: {}", drawing.edge_count());
        if skipped > 0 {
            eprintln!("[load] Skipped {skipped} zero-length segments");
        }
    }
    Ok(drawing)
}

/// One polyline part or polygon ring: connect consecutive distinct points.
fn add_stroke(
    drawing: &mut Drawing,
    seen: &mut HashMap<(u64, u64), usize>,
    points: impl Iterator<Item = (f64, f64)>,
    skipped: &mut usize,
) {
    let mut previous: Option<usize> = None;
    for (x, y) in points {
        let id = *seen
            .entry((canonical_bits(x), canonical_bits(y)))
            .or_insert_with(|| drawing.add_vertex(x, y));
        if previous == Some(id) {
            *skipped += 1;
            continue;
        }
        if let Some(prev) = previous {
            drawing.add_edge(prev, id);
        }
        previous = Some(id);
    }
}

/// Key for exact-coordinate dedup; -0.0 and 0.0 are the same point.
fn canonical_bits(coord: f64) -> u64 {
    if coord == 0.0 { 0.0f64.to_bits() } else { coord.to_bits() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strokes_merge_repeated_coordinates() {
        let mut drawing = Drawing::new();
        let mut seen = HashMap::new();
        let mut skipped = 0;
        // a closed ring revisits its first point
        add_stroke(
            &mut drawing,
            &mut seen,
            [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)].into_iter(),
            &mut skipped,
        );
        assert_eq!(drawing.vertex_count(), 3);
        assert_eq!(drawing.edge_count(), 3);
        assert_eq!(skipped, 0);

        // a second stroke along an existing edge adds nothing
        add_stroke(&mut drawing, &mut seen, [(0.0, 0.0), (1.0, 0.0)].into_iter(), &mut skipped);
        assert_eq!(drawing.vertex_count(), 3);
        assert_eq!(drawing.edge_count(), 3);
    }

    #[test]
    fn zero_length_segments_are_skipped() {
        let mut drawing = Drawing::new();
        let mut seen = HashMap::new();
        let mut skipped = 0;
        add_stroke(
            &mut drawing,
            &mut seen,
            [(0.0, 0.0), (0.0, 0.0), (2.0, 0.0)].into_iter(),
            &mut skipped,
        );
        assert_eq!(skipped, 1);
        assert_eq!(drawing.vertex_count(), 2);
        assert_eq!(drawing.edge_count(), 1);
    }

    #[test]
    fn negative_zero_is_the_same_point() {
        let mut drawing = Drawing::new();
        let mut seen = HashMap::new();
        let mut skipped = 0;
        add_stroke(
            &mut drawing,
            &mut seen,
            [(0.0, 0.0), (1.0, 0.0), (-0.0, -0.0)].into_iter(),
            &mut skipped,
        );
        assert_eq!(drawing.vertex_count(), 2);
    }
}
