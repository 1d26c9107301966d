//! Response bodies served by `nextbus-server`.
//!
//! These are plain serde types so that clients can depend on them without
//! pulling in the transit crate.

use serde::{Deserialize, Serialize};

/// Outcome of a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Found,
    StopNotFound,
    NoArrival,
    UnresolvedAddress,
    /// No stops are loaded
    Empty,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StopSummary {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtaParts {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub total_seconds: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrivalSummary {
    pub route: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip: Option<String>,
    /// Epoch seconds
    pub arrival: i64,
    pub departure: i64,
    pub eta: EtaParts,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NextBusResponse {
    pub status: QueryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<ArrivalSummary>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearestStopResponse {
    pub status: QueryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    /// Next-bus answer for the nearest stop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_bus: Option<NextBusResponse>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: u64,
    pub built_at: i64,
    pub stops: usize,
    pub arrivals: usize,
    pub vehicles: usize,
}
