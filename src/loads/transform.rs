//! Authoring-to-solver coordinate convention
//!
//! The solver swaps the authoring Y and Z axes and leaves X unchanged. The
//! swap happens only here, in [`CoordinateTransformer::to_solver_records`];
//! solver-frame values get their own type so nothing can swap them again.

use crate::loads::definition::LoadCategory;
use crate::loads::mapping::NodalForce;
use crate::loads::record::ElementLoadRecord;
use crate::mesh::types::{Point, Vec3};

/// A vector or position expressed in the solver's coordinate convention
///
/// Only [`CoordinateTransformer`] can create one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverVec3(Vec3);

impl SolverVec3 {
    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    /// Components as an array
    pub fn to_array(&self) -> [f64; 3] {
        [self.0.x, self.0.y, self.0.z]
    }

    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    /// Map back into the authoring convention
    pub fn to_authoring(&self) -> Vec3 {
        CoordinateTransformer::swap_axes(&self.0)
    }
}

impl std::ops::Add for SolverVec3 {
    type Output = SolverVec3;

    fn add(self, rhs: SolverVec3) -> SolverVec3 {
        SolverVec3(self.0 + rhs.0)
    }
}

/// Fixed Y/Z axis swap between authoring and solver conventions
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// The raw permutation `(x, y, z) -> (x, z, y)`; its own inverse
    pub fn swap_axes(v: &Vec3) -> Vec3 {
        Vec3::new(v.x, v.z, v.y)
    }

    /// Authoring-frame vector into the solver frame
    pub fn to_solver(v: &Vec3) -> SolverVec3 {
        SolverVec3(Self::swap_axes(v))
    }

    /// Authoring-frame point into the solver frame
    pub fn point_to_solver(p: &Point) -> SolverVec3 {
        Self::to_solver(&p.coords)
    }

    /// Solver zero vector
    pub fn zero() -> SolverVec3 {
        SolverVec3(Vec3::zeros())
    }

    /// Turn mapped nodal forces into solver-ready records
    ///
    /// This is the single point where outgoing vectors change convention.
    pub fn to_solver_records(
        forces: Vec<NodalForce>,
        case_id: &str,
        category: LoadCategory,
    ) -> Vec<ElementLoadRecord> {
        forces
            .into_iter()
            .map(|f| ElementLoadRecord {
                node_id: f.node_id,
                position: Self::point_to_solver(&f.position),
                force: Self::to_solver(&f.force),
                case_id: case_id.to_string(),
                category,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_is_involution() {
        let vectors = [
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-0.5, 0.0, 7.25),
            Vec3::new(1e-300, -1e300, 0.0),
            Vec3::zeros(),
        ];

        for v in vectors {
            let once = CoordinateTransformer::swap_axes(&v);
            assert_eq!(CoordinateTransformer::swap_axes(&once), v);
        }
    }

    #[test]
    fn test_swap_keeps_x() {
        let s = CoordinateTransformer::to_solver(&Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(s.to_array(), [1.0, 3.0, 2.0]);
        assert_eq!(s.to_authoring(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_records_transformed_once() {
        let forces = vec![NodalForce {
            node_id: 3,
            position: Point::new(4.0, 2.0, 0.0),
            force: Vec3::new(0.0, 0.0, -10.0),
        }];

        let records = CoordinateTransformer::to_solver_records(forces, "D1", LoadCategory::Dead);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].node_id, 3);
        assert_eq!(records[0].force.to_array(), [0.0, -10.0, 0.0]);
        assert_eq!(records[0].position.to_array(), [4.0, 0.0, 2.0]);
        assert_eq!(records[0].case_id, "D1");
        assert_eq!(records[0].category, LoadCategory::Dead);
    }
}
