//! Core geometry and topology data structures

use crate::error::{AreaLoadError, Result};
use nalgebra::{Point3, Vector3};

/// 3D point type
pub type Point = Point3<f64>;

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// Node identifier as used by the host model
pub type NodeId = usize;

/// Element identifier as used by the host model
pub type ElementId = usize;

/// Boundary edge identifier (position in the surface's ordered edge list)
pub type EdgeId = usize;

/// Shell element corner topology (3 or 4 corners)
///
/// Corners are listed in winding order; the element's edges run between
/// consecutive corners and close back to the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTopology {
    /// Element identifier
    pub id: ElementId,

    /// Corner node IDs in winding order
    pub node_ids: Vec<NodeId>,

    /// Corner node positions, parallel to `node_ids`
    pub positions: Vec<Point>,
}

impl ElementTopology {
    /// Create a new element
    pub fn new(id: ElementId, node_ids: Vec<NodeId>, positions: Vec<Point>) -> Self {
        Self {
            id,
            node_ids,
            positions,
        }
    }

    /// Get number of corner nodes
    pub fn num_corners(&self) -> usize {
        self.node_ids.len()
    }

    /// Check that the corner topology is complete
    ///
    /// A complete element has 3 or 4 corners, one finite position per corner
    /// and no repeated corner node.
    pub fn validate(&self) -> Result<()> {
        let not_found = |reason: String| AreaLoadError::ElementNotFound {
            element_id: self.id,
            reason,
        };

        let n = self.node_ids.len();
        if !(3..=4).contains(&n) {
            return Err(not_found(format!("expected 3 or 4 corner nodes, found {}", n)));
        }

        if self.positions.len() != n {
            return Err(not_found(format!(
                "{} corner nodes but {} corner positions",
                n,
                self.positions.len()
            )));
        }

        if let Some(i) = self
            .positions
            .iter()
            .position(|p| !p.coords.iter().all(|c| c.is_finite()))
        {
            return Err(not_found(format!(
                "corner node {} has a non-finite position",
                self.node_ids[i]
            )));
        }

        for i in 0..n {
            if self.node_ids[i + 1..].contains(&self.node_ids[i]) {
                return Err(not_found(format!(
                    "corner node {} is repeated",
                    self.node_ids[i]
                )));
            }
        }

        Ok(())
    }

    /// Get the element's edges as pairs of local corner indices
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let n = self.node_ids.len();
        (0..n).map(|i| (i, (i + 1) % n)).collect()
    }
}

/// Undirected edge key with the smaller node first
///
/// Two elements sharing an edge traverse it in opposite directions; the
/// canonical form makes both hash equally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub NodeId, pub NodeId);

impl EdgeKey {
    /// Create the canonical key for an edge between two nodes
    pub fn canonical(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }
}

/// One edge of a surface boundary loop
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryEdge {
    /// Position of this edge in the ordered boundary
    pub id: EdgeId,

    /// Start point (boundary winding order)
    pub start: Point,

    /// End point
    pub end: Point,

    /// Edge length
    pub length: f64,

    /// Terminal node IDs when the boundary was extracted from elements
    pub nodes: Option<(NodeId, NodeId)>,

    /// Whether the edge is supported; free edges never carry load
    pub supported: bool,
}

impl BoundaryEdge {
    /// Create a new supported edge between two points
    pub fn new(id: EdgeId, start: Point, end: Point) -> Self {
        Self {
            id,
            start,
            end,
            length: (end - start).norm(),
            nodes: None,
            supported: true,
        }
    }

    /// Vector from start to end
    pub fn vector(&self) -> Vec3 {
        self.end - self.start
    }

    /// Unit direction from start to end
    ///
    /// Only meaningful for edges of a validated [`Surface`], whose lengths
    /// are guaranteed to be non-zero.
    pub fn direction(&self) -> Vec3 {
        self.vector() / self.length
    }

    /// Midpoint of the edge
    pub fn midpoint(&self) -> Point {
        Point::from((self.start.coords + self.end.coords) / 2.0)
    }
}

/// Planar surface region bounded by a single closed edge loop
#[derive(Debug, Clone)]
pub struct Surface {
    /// Surface name (for diagnostics)
    pub name: String,

    /// Boundary vertices in winding order
    pub vertices: Vec<Point>,

    /// Boundary edges; edge `i` runs from vertex `i` to vertex `i + 1`
    pub edges: Vec<BoundaryEdge>,

    /// Outward unit normal (right-hand rule on the winding)
    pub normal: Vec3,

    /// Face area
    pub area: f64,
}

impl Surface {
    /// Get number of boundary edges
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Total boundary length
    pub fn perimeter(&self) -> f64 {
        self.edges.iter().map(|e| e.length).sum()
    }

    /// Iterate over supported edges only
    pub fn supported_edges(&self) -> impl Iterator<Item = &BoundaryEdge> {
        self.edges.iter().filter(|e| e.supported)
    }

    /// Get number of supported edges
    pub fn num_supported(&self) -> usize {
        self.supported_edges().count()
    }

    /// Vertex centroid
    pub fn centroid(&self) -> Point {
        let sum = self
            .vertices
            .iter()
            .fold(Vec3::zeros(), |acc, p| acc + p.coords);
        Point::from(sum / self.vertices.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> ElementTopology {
        ElementTopology::new(
            7,
            vec![10, 11, 12, 13],
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(1.0, 1.0, 0.0),
                Point::new(0.0, 1.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_element_edges() {
        let element = quad();
        assert_eq!(element.edges(), vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
        assert!(element.validate().is_ok());
    }

    #[test]
    fn test_element_missing_positions() {
        let mut element = quad();
        element.positions.pop();

        match element.validate() {
            Err(AreaLoadError::ElementNotFound { element_id, .. }) => assert_eq!(element_id, 7),
            other => panic!("expected ElementNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_element_bad_corner_count() {
        let element = ElementTopology::new(1, vec![0, 1], vec![Point::origin(); 2]);
        assert!(element.validate().is_err());
    }

    #[test]
    fn test_edge_key_canonical() {
        assert_eq!(EdgeKey::canonical(4, 2), EdgeKey::canonical(2, 4));
        assert_eq!(EdgeKey::canonical(4, 2), EdgeKey(2, 4));
    }

    #[test]
    fn test_boundary_edge() {
        let edge = BoundaryEdge::new(0, Point::new(0.0, 0.0, 0.0), Point::new(3.0, 4.0, 0.0));
        assert_eq!(edge.length, 5.0);
        assert!(edge.supported);
        assert_eq!(edge.midpoint(), Point::new(1.5, 2.0, 0.0));
        assert!((edge.direction().norm() - 1.0).abs() < 1e-12);
    }
}
