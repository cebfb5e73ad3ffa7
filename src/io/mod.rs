//! Format-specific reading and writing.
//!
//! - `agf` - line-graph text format for drawings
//! - `shp` - shapefile input
//! - `svg` - layered SVG report of the pipeline stages

mod agf;
mod shp;
mod svg;

pub use agf::{load_agf, write_agf, write_agf_file};
pub use shp::load_shapefile;
pub use svg::write_report;
