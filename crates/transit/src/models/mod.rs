//! Transit data models, types, and errors.

pub mod types;

// Re-exports for convenience
pub use types::{Arrival, FetchError, LoadError, ParseError, StopStatus, Vehicle, VehicleStatus};
