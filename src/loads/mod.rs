//! Load definition, projection, distribution, mapping and output transform

pub mod definition;
pub mod diagnostics;
pub mod distribution;
pub mod mapping;
pub mod projection;
pub mod record;
pub mod transform;

pub use definition::*;
pub use diagnostics::*;
pub use distribution::*;
pub use mapping::*;
pub use projection::*;
pub use record::*;
pub use transform::*;
