//! Area Load Engine Library
//!
//! Converts surface pressure definitions into equivalent nodal forces
//! expressed in the downstream solver's coordinate convention.

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod loads;
pub mod mesh;

pub use error::{AreaLoadError, Result};
