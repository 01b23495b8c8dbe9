//! Surface construction: boundary loops, normals and element skinning

use crate::error::{AreaLoadError, Result};
use crate::mesh::geometry::{
    compute_polygon_normal, distance, plane_basis, segments_intersect_2d,
    signed_distance_to_plane,
};
use crate::mesh::types::{
    BoundaryEdge, EdgeId, EdgeKey, ElementTopology, NodeId, Point, Surface, Vec3,
};
use std::collections::HashMap;

/// Edges shorter than this are degenerate
const EDGE_EPSILON: f64 = 1e-9;

/// Allowed out-of-plane offset, relative to the perimeter
const PLANARITY_TOLERANCE: f64 = 1e-6;

impl Surface {
    /// Build a surface from a closed outline
    ///
    /// Vertices are taken in winding order; a repeated closing vertex is
    /// dropped. The outward normal follows the winding by the right-hand rule.
    pub fn from_outline(name: &str, vertices: Vec<Point>) -> Result<Self> {
        build_surface(name, vertices, None)
    }

    /// Mark boundary edges as free (unsupported)
    pub fn with_free_edges(mut self, free_edges: &[EdgeId]) -> Result<Self> {
        let num_edges = self.edges.len();
        for &edge_id in free_edges {
            let edge = self.edges.get_mut(edge_id).ok_or_else(|| {
                AreaLoadError::ConfigError(format!(
                    "Free edge {} out of range for surface '{}' with {} edges",
                    edge_id, self.name, num_edges
                ))
            })?;
            edge.supported = false;
        }
        Ok(self)
    }
}

/// Build a surface from element topology by extracting its outer boundary
///
/// Edges used by exactly one element form the boundary. They are chained into
/// a single loop following the elements' winding. Elements with incomplete
/// topology are skipped here; the load mapper reports them individually.
pub fn extract_surface(name: &str, elements: &[ElementTopology]) -> Result<Surface> {
    log::info!(
        "Extracting boundary of '{}' from {} elements",
        name,
        elements.len()
    );

    let (adjacency, positions) = build_edge_adjacency(elements)?;
    let boundary = extract_boundary_edges(&adjacency);

    log::debug!("Found {} boundary edges", boundary.len());

    let loop_nodes = chain_boundary_loop(&boundary)?;
    let vertices = loop_nodes.iter().map(|id| positions[id]).collect();

    let node_pairs: Vec<(NodeId, NodeId)> = (0..loop_nodes.len())
        .map(|i| (loop_nodes[i], loop_nodes[(i + 1) % loop_nodes.len()]))
        .collect();

    build_surface(name, vertices, Some(node_pairs))
}

/// Build a map from canonical edges to the directed edges that use them
fn build_edge_adjacency(
    elements: &[ElementTopology],
) -> Result<(HashMap<EdgeKey, Vec<(NodeId, NodeId)>>, HashMap<NodeId, Point>)> {
    let mut adjacency: HashMap<EdgeKey, Vec<(NodeId, NodeId)>> = HashMap::new();
    let mut positions: HashMap<NodeId, Point> = HashMap::new();
    let mut used = 0;

    for element in elements {
        if let Err(e) = element.validate() {
            log::warn!("Skipping element during boundary extraction: {}", e);
            continue;
        }
        used += 1;

        for (&node_id, position) in element.node_ids.iter().zip(&element.positions) {
            positions.entry(node_id).or_insert(*position);
        }

        for (i, j) in element.edges() {
            let a = element.node_ids[i];
            let b = element.node_ids[j];
            adjacency
                .entry(EdgeKey::canonical(a, b))
                .or_default()
                .push((a, b));
        }
    }

    if used == 0 {
        return Err(AreaLoadError::DegenerateGeometry(
            "No element with complete corner topology".to_string(),
        ));
    }

    Ok((adjacency, positions))
}

/// Extract boundary edges (edges with exactly one adjacent element)
fn extract_boundary_edges(
    edge_adjacency: &HashMap<EdgeKey, Vec<(NodeId, NodeId)>>,
) -> Vec<(NodeId, NodeId)> {
    let mut boundary: Vec<(NodeId, NodeId)> = edge_adjacency
        .values()
        .filter(|uses| uses.len() == 1)
        .map(|uses| uses[0])
        .collect();

    // HashMap iteration order is arbitrary
    boundary.sort_unstable();
    boundary
}

/// Chain directed boundary edges into one closed loop of node IDs
///
/// The loop starts at the smallest node ID so the result is deterministic.
fn chain_boundary_loop(boundary: &[(NodeId, NodeId)]) -> Result<Vec<NodeId>> {
    if boundary.len() < 3 {
        return Err(AreaLoadError::DegenerateGeometry(format!(
            "Boundary has {} edges, at least 3 required",
            boundary.len()
        )));
    }

    let mut next: HashMap<NodeId, NodeId> = HashMap::with_capacity(boundary.len());
    for &(a, b) in boundary {
        if next.insert(a, b).is_some() {
            return Err(AreaLoadError::DegenerateGeometry(format!(
                "Boundary branches at node {} (pinched region or inconsistent winding)",
                a
            )));
        }
    }

    // Sorted, so the first edge starts at the smallest node
    let start = boundary[0].0;
    let mut loop_nodes = vec![start];
    let mut current = start;

    loop {
        let following = *next.get(&current).ok_or_else(|| {
            AreaLoadError::DegenerateGeometry(format!(
                "Boundary is open at node {} (inconsistent element winding)",
                current
            ))
        })?;

        if following == start {
            break;
        }
        if loop_nodes.len() >= boundary.len() {
            return Err(AreaLoadError::DegenerateGeometry(
                "Boundary does not close".to_string(),
            ));
        }

        loop_nodes.push(following);
        current = following;
    }

    if loop_nodes.len() != boundary.len() {
        return Err(AreaLoadError::DegenerateGeometry(format!(
            "Boundary splits into several loops ({} of {} edges in the outer loop); holes are not supported",
            loop_nodes.len(),
            boundary.len()
        )));
    }

    Ok(loop_nodes)
}

/// Validate an outline and assemble the surface
fn build_surface(
    name: &str,
    mut vertices: Vec<Point>,
    node_pairs: Option<Vec<(NodeId, NodeId)>>,
) -> Result<Surface> {
    if let Some(i) = vertices
        .iter()
        .position(|p| !p.coords.iter().all(|c| c.is_finite()))
    {
        return Err(AreaLoadError::DegenerateGeometry(format!(
            "Surface '{}' vertex {} is not finite",
            name, i
        )));
    }

    if vertices.len() > 3 && node_pairs.is_none() {
        let first = vertices[0];
        if let Some(last) = vertices.last() {
            if distance(&first, last) < EDGE_EPSILON {
                vertices.pop();
            }
        }
    }

    if vertices.len() < 3 {
        return Err(AreaLoadError::DegenerateGeometry(format!(
            "Surface '{}' has {} boundary edges, at least 3 required",
            name,
            vertices.len()
        )));
    }

    let n = vertices.len();
    let mut edges = Vec::with_capacity(n);
    for i in 0..n {
        let mut edge = BoundaryEdge::new(i, vertices[i], vertices[(i + 1) % n]);
        if edge.length < EDGE_EPSILON {
            return Err(AreaLoadError::DegenerateGeometry(format!(
                "Surface '{}' edge {} has zero length",
                name, i
            )));
        }
        if let Some(pairs) = &node_pairs {
            edge.nodes = Some(pairs[i]);
        }
        edges.push(edge);
    }

    let (normal, area) = compute_polygon_normal(&vertices).map_err(|e| match e {
        AreaLoadError::DegenerateGeometry(msg) => {
            AreaLoadError::DegenerateGeometry(format!("Surface '{}': {}", name, msg))
        }
        other => other,
    })?;

    let perimeter: f64 = edges.iter().map(|e| e.length).sum();
    check_planarity(name, &vertices, &normal, perimeter)?;
    check_self_intersection(name, &vertices, &normal)?;

    log::debug!(
        "Surface '{}': {} edges, area {:.6}, normal ({:.4}, {:.4}, {:.4})",
        name,
        n,
        area,
        normal.x,
        normal.y,
        normal.z
    );

    Ok(Surface {
        name: name.to_string(),
        vertices,
        edges,
        normal,
        area,
    })
}

fn check_planarity(
    name: &str,
    vertices: &[Point],
    normal: &Vec3,
    perimeter: f64,
) -> Result<()> {
    let tolerance = PLANARITY_TOLERANCE * perimeter.max(1.0);
    let origin = vertices[0];

    for (i, vertex) in vertices.iter().enumerate() {
        let offset = signed_distance_to_plane(vertex, &origin, normal);
        if offset.abs() > tolerance {
            return Err(AreaLoadError::DegenerateGeometry(format!(
                "Surface '{}' is not planar: vertex {} lies {:.3e} off the face plane",
                name, i, offset
            )));
        }
    }

    Ok(())
}

fn check_self_intersection(
    name: &str,
    vertices: &[Point],
    normal: &Vec3,
) -> Result<()> {
    let (u, v) = plane_basis(normal);
    let origin = vertices[0];
    let flat: Vec<(f64, f64)> = vertices
        .iter()
        .map(|p| {
            let d = p - origin;
            (d.dot(&u), d.dot(&v))
        })
        .collect();

    let n = flat.len();
    for i in 0..n {
        for j in i + 1..n {
            // Adjacent edges share a vertex by construction
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }

            if segments_intersect_2d(flat[i], flat[(i + 1) % n], flat[j], flat[(j + 1) % n]) {
                return Err(AreaLoadError::DegenerateGeometry(format!(
                    "Surface '{}' boundary self-intersects (edges {} and {})",
                    name, i, j
                )));
            }
        }
    }

    Ok(())
}
