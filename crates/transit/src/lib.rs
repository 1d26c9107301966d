//! # nextbus-transit
//!
//! Realtime "when is my bus?" data management.
//!
//! ## Features
//!
//! - **Static stop catalog**: stop ids, names and coordinates from a `stops.txt` table
//! - **Realtime overlay**: GTFS-RT vehicle positions and trip updates merged into
//!   per-stop, time-ordered arrival indexes
//! - **Snapshots**: every refresh publishes a complete new snapshot; queries never
//!   see a half-built one
//! - **Queries**: next bus at a stop (optionally for one route) and nearest stop
//!   to a coordinate
//! - **Pluggable networking**: implement [`FeedFetcher`] to supply feeds from anywhere
//!
//! ## Example
//!
//! ```
//! use nextbus_transit::prelude::*;
//! use geo::Point;
//!
//! let catalog = StopCatalog::from_stops(vec![
//!     Stop::new("1123", "University / Phillip", 43.4722, -80.5449),
//!     Stop::new("1000", "Charles Terminal", 43.448, -80.489),
//! ]);
//! let mut snapshot = Snapshot::from_catalog(catalog, 1_700_000_000);
//! snapshot
//!     .board
//!     .arrivals_mut(&StopIdentifier::new("1123"))
//!     .unwrap()
//!     .insert(Arrival::new("201", 1_700_000_090, 1_700_000_100));
//!
//! let next = snapshot.next_bus(&StopIdentifier::new("1123"), None);
//! let eta = Eta::until(next.found().unwrap().arrival.arrival, 1_700_000_000);
//! assert_eq!(render(&eta), "1 minute and 30 seconds. Better hurry up!");
//!
//! // University / Phillip is the closer of the two
//! let NearestStop::Found { stop, .. } = snapshot.nearest_stop(Point::new(-80.54, 43.47)) else {
//!     unreachable!()
//! };
//! assert_eq!(stop.id.as_str(), "1123");
//! ```

pub mod arrivals;
pub mod board;
pub mod catalog;
pub mod eta;
pub mod identifiers;
pub mod ingest;
pub mod models;
pub mod network;
pub mod query;
pub mod realtime;
pub mod refresh;
pub mod snapshot;
pub mod spatial;
pub mod sweep;
pub mod vehicles;

// Re-exports for convenience
pub mod prelude {
    pub use crate::arrivals::ArrivalIndex;
    pub use crate::board::{BoardEntry, StopBoard};
    pub use crate::catalog::{Stop, StopCatalog};
    pub use crate::eta::{decompose, render, seconds_until, Eta, ARRIVING_NOW};
    pub use crate::identifiers::*;
    pub use crate::ingest::{ingest_trip_updates, IngestionReport};
    pub use crate::models::types::*;
    pub use crate::network::traits::*;
    pub use crate::network::HttpFetcher;
    pub use crate::query::{ArrivalResult, NearestStop, NextBus, QueryEngine};
    pub use crate::refresh::{CatalogSource, CycleReport, FeedSources, RefreshOptions, Refresher, SourceOutcome};
    pub use crate::snapshot::{Snapshot, SnapshotPublisher, SnapshotReader};
    pub use crate::sweep::sweep;
    pub use crate::vehicles::VehicleRegistry;
}

pub use prelude::*;
