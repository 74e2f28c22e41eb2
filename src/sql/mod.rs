//! Safe SQL builder: identifiers from the registry only, values as parameters.

pub mod builder;
pub mod params;
pub use params::*;
