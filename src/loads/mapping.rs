//! Equivalent nodal loads from edge weights and element topology

use crate::loads::diagnostics::Diagnostic;
use crate::loads::distribution::EdgeWeights;
use crate::mesh::geometry::{distance, point_segment_distance};
use crate::mesh::types::{ElementTopology, NodeId, Point, Surface, Vec3};
use std::collections::HashMap;

/// Relative distance within which an element node lies on a boundary edge
const ON_EDGE_TOLERANCE: f64 = 1e-6;

/// Nodal force in the authoring frame
///
/// Only [`CoordinateTransformer`](crate::loads::CoordinateTransformer) turns
/// these into solver records.
#[derive(Debug, Clone, PartialEq)]
pub struct NodalForce {
    pub node_id: NodeId,
    pub position: Point,
    pub force: Vec3,
}

/// Result of mapping one instance onto its elements
#[derive(Debug, Clone)]
pub struct MappingOutcome {
    /// Accumulated nodal forces in node enumeration order
    pub forces: Vec<NodalForce>,

    /// Total force assigned to each boundary edge (edge order)
    pub edge_forces: Vec<f64>,

    /// Elements that could not be processed, as `ElementSkipped`
    pub failures: Vec<Diagnostic>,
}

impl MappingOutcome {
    /// Vector sum of all nodal forces
    pub fn resultant(&self) -> Vec3 {
        self.forces.iter().fold(Vec3::zeros(), |acc, f| acc + f.force)
    }
}

/// Lump edge loads onto element corner nodes
///
/// Boundary edge `e` carries `effective_pressure * w_e * surface.area`, acting
/// along `direction`. Each element edge lying along `e` takes the fraction of
/// that force matching its share of the edge length, split equally between its
/// two end nodes. Forces on a shared node add up. Elements with incomplete
/// topology are reported in `failures` without stopping the others.
pub fn map_to_elements(
    effective_pressure: f64,
    direction: &Vec3,
    weights: &EdgeWeights,
    surface: &Surface,
    elements: &[ElementTopology],
) -> MappingOutcome {
    let unit = direction.normalize();
    let edge_forces: Vec<f64> = surface
        .edges
        .iter()
        .map(|e| effective_pressure * weights.get(e.id) * surface.area)
        .collect();

    let mut order: Vec<NodalForce> = Vec::new();
    let mut index: HashMap<NodeId, usize> = HashMap::new();
    let mut covered = vec![0.0; surface.num_edges()];
    let mut failures = Vec::new();

    let mut add = |node_id: NodeId, position: Point, amount: f64| {
        let slot = *index.entry(node_id).or_insert_with(|| {
            order.push(NodalForce {
                node_id,
                position,
                force: Vec3::zeros(),
            });
            order.len() - 1
        });
        order[slot].force += unit * amount;
    };

    for element in elements {
        if let Err(e) = element.validate() {
            log::warn!("{}", e);
            failures.push(Diagnostic::from_error(&e));
            continue;
        }

        for (i, j) in element.edges() {
            let (a, b) = (element.positions[i], element.positions[j]);

            let Some(edge) = surface.edges.iter().find(|edge| {
                let tolerance = ON_EDGE_TOLERANCE * edge.length.max(1.0);
                point_segment_distance(&a, &edge.start, &edge.end) <= tolerance
                    && point_segment_distance(&b, &edge.start, &edge.end) <= tolerance
            }) else {
                continue;
            };

            let segment = distance(&a, &b);
            covered[edge.id] += segment;

            let share = edge_forces[edge.id] * segment / edge.length;
            add(element.node_ids[i], a, share / 2.0);
            add(element.node_ids[j], b, share / 2.0);
        }
    }

    for edge in &surface.edges {
        let gap = (covered[edge.id] - edge.length).abs();
        if weights.get(edge.id) > 0.0 && gap > ON_EDGE_TOLERANCE * edge.length.max(1.0) {
            log::warn!(
                "Surface '{}' edge {} is covered by {:.6} of {:.6} length units of element edges",
                surface.name,
                edge.id,
                covered[edge.id],
                edge.length
            );
        }
    }

    MappingOutcome {
        forces: order,
        edge_forces,
        failures,
    }
}
