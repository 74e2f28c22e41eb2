//! Request extractors: hook context, list params, path segments, JSON object bodies.

pub mod body;
pub mod context;
pub mod params;
pub mod path;

pub use body::JsonObject;
pub use params::{ListParams, DEFAULT_PAGE_SIZE};
pub use path::PathParam;
