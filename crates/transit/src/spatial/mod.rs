//! Great-circle distance utilities.

pub mod queries;

pub use queries::{haversine_distance, nearest_by_distance};
