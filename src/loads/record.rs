//! Solver-ready output records

use crate::loads::definition::LoadCategory;
use crate::loads::transform::{CoordinateTransformer, SolverVec3};
use crate::mesh::types::NodeId;

/// Equivalent nodal force handed to the downstream aggregator/solver
///
/// Created fresh on every computation pass and owned by the caller; the
/// engine keeps no reference to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementLoadRecord {
    /// Node the force acts on
    pub node_id: NodeId,

    /// Node position (solver convention)
    pub position: SolverVec3,

    /// Force vector (solver convention)
    pub force: SolverVec3,

    /// Load case identifier
    pub case_id: String,

    /// Load category
    pub category: LoadCategory,
}

/// Vector sum of record forces (solver convention)
pub fn total_force(records: &[ElementLoadRecord]) -> SolverVec3 {
    records
        .iter()
        .fold(CoordinateTransformer::zero(), |acc, r| acc + r.force)
}
