use rand::Rng;
use smallvec::SmallVec;

/// A position in the plane.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A vertex of the drawing. `original` is the immutable input position;
/// `current` is the working position moved around by the various phases.
///
/// `neighbors` lists the ids of incident edges. Once `set_rotation_order` has
/// run, the list is sorted by the polar angle towards the other endpoint and
/// encodes the combinatorial embedding; it is never re-sorted afterwards.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub original: Point,
    pub current: Point,
    pub id: usize,
    pub is_rounded: bool,
    pub density: f64,
    pub neighbors: SmallVec<[usize; 8]>,
}

impl Vertex {
    fn set_rounded_state(&mut self) {
        self.is_rounded =
            self.current.x == self.current.x.floor() && self.current.y == self.current.y.floor();
    }

    /// Euclidean distance from the working position back to the input position.
    pub fn rounding_cost(&self) -> f64 {
        let dx = self.current.x - self.original.x;
        let dy = self.current.y - self.original.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An edge between two vertex ids. The pair is stored in a fixed order but
/// carries no direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
}

impl Edge {
    /// The endpoint that is not `v`.
    #[inline]
    pub fn other(&self, v: usize) -> usize {
        if v == self.a { self.b } else { self.a }
    }
}

/// A planar graph drawing: vertices with dense ids `0..n` and the edges
/// between them. Both endpoints' incidence lists reference the same edge id.
#[derive(Debug, Default, Clone)]
pub struct Drawing {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex at `(x, y)`; both original and current positions start
    /// there. Returns the new vertex id.
    pub fn add_vertex(&mut self, x: f64, y: f64) -> usize {
        let id = self.vertices.len();
        let mut vertex = Vertex {
            original: Point { x, y },
            current: Point { x, y },
            id,
            is_rounded: false,
            density: 0.0,
            neighbors: SmallVec::new(),
        };
        vertex.set_rounded_state();
        self.vertices.push(vertex);
        id
    }

    /// Add an edge between `a` and `b`. Duplicate edges and self-loops are a
    /// silent no-op.
    pub fn add_edge(&mut self, a: usize, b: usize) -> Option<usize> {
        if a == b {
            return None;
        }
        if self.vertices[a].neighbors.iter().any(|&e| self.edges[e].other(a) == b) {
            return None;
        }
        let id = self.edges.len();
        self.edges.push(Edge { a, b });
        self.vertices[a].neighbors.push(id);
        self.vertices[b].neighbors.push(id);
        Some(id)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn vertex(&self, v: usize) -> &Vertex {
        &self.vertices[v]
    }

    #[inline]
    pub fn current(&self, v: usize) -> Point {
        self.vertices[v].current
    }

    #[inline]
    pub fn original(&self, v: usize) -> Point {
        self.vertices[v].original
    }

    /// Move vertex `v` and refresh its rounded flag.
    pub fn set_current(&mut self, v: usize, p: Point) {
        let vertex = &mut self.vertices[v];
        vertex.current = p;
        vertex.set_rounded_state();
    }

    pub(crate) fn set_density(&mut self, v: usize, density: f64) {
        self.vertices[v].density = density;
    }

    pub(crate) fn refresh_rounded_all(&mut self) {
        for vertex in &mut self.vertices {
            vertex.set_rounded_state();
        }
    }

    pub fn num_rounded(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_rounded).count()
    }

    #[inline]
    pub fn rounding_cost_of(&self, v: usize) -> f64 {
        self.vertices[v].rounding_cost()
    }

    /// Total displacement from the input positions.
    pub fn rounding_cost(&self) -> f64 {
        self.vertices.iter().map(Vertex::rounding_cost).sum()
    }

    pub(crate) fn distance_sqr(&self, u: usize, v: usize) -> f64 {
        let dx = self.vertices[u].current.x - self.vertices[v].current.x;
        let dy = self.vertices[u].current.y - self.vertices[v].current.y;
        dx * dx + dy * dy
    }

    /// Polar angle at `v` of incident edge `e`, towards the other endpoint.
    pub fn angle_at(&self, v: usize, e: usize) -> f64 {
        let w = self.edges[e].other(v);
        let p = self.vertices[v].current;
        let q = self.vertices[w].current;
        (q.y - p.y).atan2(q.x - p.x)
    }

    /// Sort every incidence list by angle, fixing the combinatorial embedding.
    /// Called once after loading; later phases only check against this order.
    pub fn set_rotation_order(&mut self) {
        for v in 0..self.vertices.len() {
            let mut order: SmallVec<[(f64, usize); 8]> = self.vertices[v]
                .neighbors
                .iter()
                .map(|&e| (self.angle_at(v, e), e))
                .collect();
            order.sort_by(|a, b| a.0.total_cmp(&b.0));
            self.vertices[v].neighbors = order.into_iter().map(|(_, e)| e).collect();
        }
    }

    /// Snapshot of all current positions, indexed by vertex id.
    pub fn positions(&self) -> Vec<Point> {
        self.vertices.iter().map(|v| v.current).collect()
    }

    /// Bounding box of the current positions, `None` for an empty drawing.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = self.vertices.first()?;
        let mut min = first.current;
        let mut max = first.current;
        for vertex in &self.vertices {
            min.x = min.x.min(vertex.current.x);
            min.y = min.y.min(vertex.current.y);
            max.x = max.x.max(vertex.current.x);
            max.y = max.y.max(vertex.current.y);
        }
        Some((min, max))
    }

    /// Largest side of the bounding box.
    pub fn extent(&self) -> f64 {
        match self.bounds() {
            Some((min, max)) => (max.x - min.x).max(max.y - min.y),
            None => 0.0,
        }
    }

    /// Shift original and current positions so the bounding box is centered on
    /// the origin. Returns the old center.
    pub fn center(&mut self) -> Option<Point> {
        let (min, max) = self.bounds()?;
        let cx = (max.x - min.x) / 2.0 + min.x;
        let cy = (max.y - min.y) / 2.0 + min.y;
        for vertex in &mut self.vertices {
            vertex.current.x -= cx;
            vertex.current.y -= cy;
            vertex.original.x -= cx;
            vertex.original.y -= cy;
            vertex.set_rounded_state();
        }
        Some(Point { x: cx, y: cy })
    }

    /// Rescale original and current positions so the larger extent becomes
    /// `grid` units.
    pub fn fit_to_grid(&mut self, grid: u32) {
        let extent = self.extent();
        if extent <= 0.0 {
            return;
        }
        let scale = f64::from(grid) / extent;
        for vertex in &mut self.vertices {
            vertex.current.x *= scale;
            vertex.current.y *= scale;
            vertex.original.x *= scale;
            vertex.original.y *= scale;
            vertex.set_rounded_state();
        }
    }

    /// Random move of one vertex. A rounded vertex steps to one of its eight
    /// grid neighbors; a fractional vertex snaps each coordinate to the floor
    /// or ceiling by coin flip.
    pub fn mutate<R: Rng + ?Sized>(&mut self, v: usize, rng: &mut R) {
        let p = self.vertices[v].current;
        if self.vertices[v].is_rounded {
            let mut dx = 0i32;
            let mut dy = 0i32;
            // rejection sampling to force movement
            while dx == 0 && dy == 0 {
                dx = rng.random_range(0..3i32) - 1;
                dy = rng.random_range(0..3i32) - 1;
            }
            self.set_current(v, Point { x: p.x + f64::from(dx), y: p.y + f64::from(dy) });
        } else {
            let x = if rng.random_bool(0.5) { p.x.floor() } else { p.x.ceil() };
            let y = if rng.random_bool(0.5) { p.y.floor() } else { p.y.ceil() };
            self.set_current(v, Point { x, y });
        }
    }
}
