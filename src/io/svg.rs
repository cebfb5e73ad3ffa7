use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::drawing::{Drawing, Point};

const STYLES: &str = r#"<defs>
<style type="text/css"><![CDATA[
#grid {
    stroke: lightgray;
    stroke-width: 0.05;
}
#original {
    stroke: pink;
    fill: pink;
    stroke-width: 0.15;
    stroke-linecap: round;
}
#preprocessed {
    stroke: red;
    fill: red;
    stroke-width: 0.05;
    stroke-linecap: round;
    display: none;
}
#feasible {
    stroke: green;
    fill: green;
    stroke-width: 0.05;
    stroke-linecap: round;
    display: none;
}
#annealed {
    stroke: blue;
    fill: blue;
    stroke-width: 0.05;
    stroke-linecap: round;
    display: none;
}
#solution {
    stroke: black;
    fill: black;
    stroke-width: 0.05;
    stroke-linecap: round;
}
]]></style>
</defs>"#;

pub(crate) struct SvgWriter {
    writer: BufWriter<File>,
}

/// Implement std::io::Write so `write!` / `writeln!` work.
impl Write for SvgWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl SvgWriter {
    pub(crate) fn new(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("[svg] Failed to create {}", path.display()))?;
        Ok(SvgWriter { writer: BufWriter::new(file) })
    }

    fn write_header(&mut self, width: f64, height: f64) -> Result<()> {
        writeln!(
            self,
            r#"<svg viewBox="-1 -1 {width} {height}" xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">"#
        )?;
        writeln!(self, "{STYLES}")?;
        Ok(())
    }

    fn write_grid(&mut self, width: f64, height: f64) -> Result<()> {
        writeln!(self, r#"<g inkscape:label="Grid" inkscape:groupmode="layer" id="grid">"#)?;
        let mut x = 0i64;
        while x as f64 <= width {
            writeln!(self, r#"<line x1="{0}" x2="{0}" y1="0" y2="{1}"/>"#, x, height.ceil())?;
            x += 1;
        }
        let mut y = 0i64;
        while y as f64 <= height {
            writeln!(self, r#"<line x1="0" x2="{1}" y1="{0}" y2="{0}"/>"#, y, width.ceil())?;
            y += 1;
        }
        writeln!(self, "</g>")?;
        Ok(())
    }

    /// One stage of the pipeline as an inkscape layer: the edges as lines and
    /// the vertices as dots, at the given per-vertex positions.
    fn write_layer(
        &mut self,
        label: &str,
        id: &str,
        drawing: &Drawing,
        positions: &[Point],
        min: Point,
    ) -> Result<()> {
        writeln!(self, r#"<g inkscape:label="{label}" inkscape:groupmode="layer" id="{id}">"#)?;
        for edge in drawing.edges() {
            let a = positions[edge.a];
            let b = positions[edge.b];
            writeln!(
                self,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
                a.x - min.x,
                -min.y - a.y,
                b.x - min.x,
                -min.y - b.y
            )?;
        }
        for p in positions {
            writeln!(self, r#"<circle cx="{}" cy="{}" r="0.05"/>"#, p.x - min.x, -min.y - p.y)?;
        }
        writeln!(self, "</g>")?;
        Ok(())
    }

    fn write_footer(&mut self) -> Result<()> {
        writeln!(self, "</svg>")?;
        Ok(())
    }
}

/// Write the layered report: a unit grid plus the original, preprocessed,
/// first-feasible, annealed, and final positions. The intermediate layers are
/// hidden by default and can be toggled in an editor.
pub fn write_report(
    drawing: &Drawing,
    preprocessed: &[Point],
    feasible: &[Point],
    annealed: &[Point],
    path: &Path,
    verbose: u8,
) -> Result<()> {
    let Some((min, max)) = drawing.bounds() else {
        return Ok(());
    };
    let width = (max.x - min.x).ceil();
    let height = (max.y - min.y).ceil();
    if width > 1000.0 || height > 1000.0 {
        eprintln!("[svg] Grid is very big; SVG file will be unwieldy.");
    }

    let originals: Vec<Point> = drawing.vertices().iter().map(|v| v.original).collect();
    let currents = drawing.positions();

    let mut svg = SvgWriter::new(path)?;
    svg.write_header(width + 3.0, height + 3.0)?;
    svg.write_grid(width + 1.0, height + 1.0)?;
    svg.write_layer("Original", "original", drawing, &originals, min)?;
    svg.write_layer("Preprocessed", "preprocessed", drawing, preprocessed, min)?;
    svg.write_layer("Feasible", "feasible", drawing, feasible, min)?;
    svg.write_layer("Annealed", "annealed", drawing, annealed, min)?;
    svg.write_layer("Solution", "solution", drawing, &currents, min)?;
    svg.write_footer()?;
    svg.flush()?;
    if verbose > 0 {
        eprintln!("[svg] Wrote {}", path.display());
    }
    Ok(())
}
