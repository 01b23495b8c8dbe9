//! Surface geometry and element topology

pub mod geometry;
pub mod surface;
pub mod types;

pub use geometry::*;
pub use surface::*;
pub use types::*;
