mod checkpoint;
mod drawing;

pub use drawing::{Drawing, Edge, Point, Vertex};
