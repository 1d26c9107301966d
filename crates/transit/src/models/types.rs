//! Core data types, enums and errors for realtime transit data.

use std::time::Duration;

use geo::Point;

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// Service status of the trip a vehicle is running.
///
/// Mirrors the GTFS-RT trip schedule relationship. Anything other than
/// `Scheduled` means the vehicle's arrivals should no longer be offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VehicleStatus {
    Scheduled,
    Added,
    Unscheduled,
    Canceled,
    /// Provider-specific value outside the canonical set
    Other(i32),
}

impl VehicleStatus {
    /// Unset on the wire means scheduled.
    pub fn from_wire(value: Option<i32>) -> Self {
        match value.unwrap_or(0) {
            0 => Self::Scheduled,
            1 => Self::Added,
            2 => Self::Unscheduled,
            3 => Self::Canceled,
            other => Self::Other(other),
        }
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled)
    }
}

/// Where a vehicle is relative to its current stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopStatus {
    IncomingAt,
    StoppedAt,
    InTransitTo,
    Other(i32),
}

impl StopStatus {
    /// Unset on the wire means in transit.
    pub fn from_wire(value: Option<i32>) -> Self {
        match value.unwrap_or(2) {
            0 => Self::IncomingAt,
            1 => Self::StoppedAt,
            2 => Self::InTransitTo,
            other => Self::Other(other),
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// One upcoming visit of a route to a stop.
///
/// Times are epoch seconds. Several arrivals of the same route may exist at one stop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arrival {
    pub route_id: RouteIdentifier,
    /// Trip that produced this arrival, used to find the vehicle running it
    pub trip_id: Option<TripIdentifier>,
    pub arrival: i64,
    pub departure: i64,
}

impl Arrival {
    pub fn new(route_id: impl Into<RouteIdentifier>, arrival: i64, departure: i64) -> Self {
        Self {
            route_id: route_id.into(),
            trip_id: None,
            arrival,
            departure,
        }
    }

    pub fn with_trip(mut self, trip_id: impl Into<TripIdentifier>) -> Self {
        self.trip_id = Some(trip_id.into());
        self
    }

    /// Has this arrival already left the stop at `now`?
    pub fn has_departed(&self, now: i64) -> bool {
        self.departure < now
    }
}

/// Last reported state of the vehicle running a trip.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub trip_id: TripIdentifier,
    pub vehicle_id: Option<VehicleIdentifier>,
    pub route_id: Option<RouteIdentifier>,
    pub stop_sequence: Option<u32>,
    /// `x` is longitude, `y` is latitude
    pub position: Option<Point>,
    pub status: VehicleStatus,
    pub stop_status: StopStatus,
}

// ============================================================================
// Errors
// ============================================================================

/// Failure to produce a stop catalog.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Stop catalog unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stop catalog malformed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Stop {stop_id} has no {field} field")]
    MissingField { stop_id: String, field: &'static str },

    #[error("Stop {stop_id} has invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate {
        stop_id: String,
        latitude: String,
        longitude: String,
    },

    #[error("Stop catalog contains no stops")]
    NoStops,

    #[error("Stop catalog fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// A realtime snapshot that cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Feed payload too large: {size} bytes (max {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("Feed payload is not a valid feed message: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Feed payload has no header")]
    MissingHeader,

    #[error("Differential feeds are not supported")]
    Differential,
}

/// Failure to retrieve a payload from its source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}
