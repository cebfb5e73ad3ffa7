use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::drawing::{Drawing, Point};

/// Load a line-graph file: vertex count, edge count, one `ox oy [cx cy]` line
/// per vertex, one `i j` line per edge. The current pair is optional and
/// defaults to the original position.
pub fn load_agf(path: &Path, verbose: u8) -> Result<Drawing> {
    if verbose > 0 {
        eprintln!("[load] Loading line-graph file...");
    }
    let file = File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
    let drawing = read_agf(BufReader::new(file))
        .with_context(|| format!("failed to parse '{}'", path.display()))?;
    if verbose > 0 {
        eprintln!("[load] Number of points: {}", drawing.vertex_count());
        eprintln!("[load] Number of segments: {}", drawing.edge_count());
    }
    Ok(drawing)
}

pub(crate) fn read_agf(reader: impl BufRead) -> Result<Drawing> {
    let mut lines = reader.lines();
    let mut next_line = |what: &str| -> Result<String> {
        match lines.next() {
            Some(line) => Ok(line?),
            None => bail!("unexpected end of file while reading {what}"),
        }
    };

    let num_vertices: usize =
        next_line("the vertex count")?.trim().parse().context("bad vertex count")?;
    let num_edges: usize = next_line("the edge count")?.trim().parse().context("bad edge count")?;

    let mut drawing = Drawing::new();
    for i in 0..num_vertices {
        let line = next_line("a vertex")?;
        let coords: Vec<f64> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .with_context(|| format!("bad coordinates on vertex line {i}"))?;
        match coords.as_slice() {
            [ox, oy] => {
                drawing.add_vertex(*ox, *oy);
            }
            [ox, oy, cx, cy] => {
                let v = drawing.add_vertex(*ox, *oy);
                drawing.set_current(v, Point { x: *cx, y: *cy });
            }
            _ => bail!("expected 2 or 4 coordinates on vertex line {i}"),
        }
    }
    for i in 0..num_edges {
        let line = next_line("an edge")?;
        let mut fields = line.split_whitespace();
        let a: usize = fields
            .next()
            .with_context(|| format!("missing endpoint on edge line {i}"))?
            .parse()
            .with_context(|| format!("bad endpoint on edge line {i}"))?;
        let b: usize = fields
            .next()
            .with_context(|| format!("missing endpoint on edge line {i}"))?
            .parse()
            .with_context(|| format!("bad endpoint on edge line {i}"))?;
        if a >= num_vertices || b >= num_vertices {
            bail!("edge line {i} references a vertex out of range");
        }
        drawing.add_edge(a, b);
    }
    Ok(drawing)
}

/// Write the drawing in the line-graph format, originals first.
pub fn write_agf<W: Write>(drawing: &Drawing, out: &mut W) -> Result<()> {
    writeln!(out, "{}", drawing.vertex_count())?;
    writeln!(out, "{}", drawing.edge_count())?;
    for vertex in drawing.vertices() {
        writeln!(
            out,
            "{} {} {} {}",
            vertex.original.x, vertex.original.y, vertex.current.x, vertex.current.y
        )?;
    }
    for edge in drawing.edges() {
        writeln!(out, "{} {}", edge.a, edge.b)?;
    }
    Ok(())
}

pub fn write_agf_file(drawing: &Drawing, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_agf(drawing, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_vertices_edges_and_optional_currents() {
        let text = "3\n2\n0 0\n0.25 0.6 0 1\n0 1.2\n0 1\n1 2\n";
        let drawing = read_agf(text.as_bytes()).unwrap();
        assert_eq!(drawing.vertex_count(), 3);
        assert_eq!(drawing.edge_count(), 2);
        assert_eq!(drawing.original(1), Point { x: 0.25, y: 0.6 });
        assert_eq!(drawing.current(1), Point { x: 0.0, y: 1.0 });
        assert!(drawing.vertex(1).is_rounded);
        assert_eq!(drawing.current(2), Point { x: 0.0, y: 1.2 });
        assert!(!drawing.vertex(2).is_rounded);
        assert_eq!(drawing.edges()[0].a, 0);
        assert_eq!(drawing.edges()[1].b, 2);
    }

    #[test]
    fn duplicate_edges_in_the_file_are_dropped() {
        let text = "2\n3\n0 0\n1 0\n0 1\n1 0\n0 1\n";
        let drawing = read_agf(text.as_bytes()).unwrap();
        assert_eq!(drawing.edge_count(), 1);
    }

    #[test]
    fn truncated_and_malformed_files_are_errors() {
        assert!(read_agf("2\n0\n0 0\n".as_bytes()).is_err());
        assert!(read_agf("nope\n".as_bytes()).is_err());
        assert!(read_agf("1\n0\n0 0 0\n".as_bytes()).is_err());
        assert!(read_agf("1\n1\n0 0\n0 7\n".as_bytes()).is_err());
    }

    #[test]
    fn round_trips_through_the_text_format() {
        let mut drawing = Drawing::new();
        drawing.add_vertex(0.5, -1.25);
        drawing.add_vertex(2.0, 3.0);
        drawing.add_edge(0, 1);
        drawing.set_current(0, Point { x: 1.0, y: -1.0 });

        let mut buffer = Vec::new();
        write_agf(&drawing, &mut buffer).unwrap();
        let reloaded = read_agf(buffer.as_slice()).unwrap();
        assert_eq!(reloaded.vertex_count(), 2);
        assert_eq!(reloaded.edge_count(), 1);
        assert_eq!(reloaded.original(0), Point { x: 0.5, y: -1.25 });
        assert_eq!(reloaded.current(0), Point { x: 1.0, y: -1.0 });
        assert_eq!(reloaded.current(1), Point { x: 2.0, y: 3.0 });
    }
}
