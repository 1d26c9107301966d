//! Next-arrival and nearest-stop queries.
//!
//! Queries never fail: "no such stop", "no bus" and "no stops at all" are
//! ordinary results.

use std::sync::Arc;

use geo::Point;

use crate::catalog::Stop;
use crate::identifiers::{RouteIdentifier, StopIdentifier};
use crate::models::Arrival;
use crate::snapshot::{Snapshot, SnapshotReader};
use crate::spatial::nearest_by_distance;

/// The arrival that answered a next-bus query.
#[derive(Clone, Debug, PartialEq)]
pub struct NextBus {
    pub stop: Arc<Stop>,
    pub arrival: Arrival,
    /// The caller asked for a particular route
    pub route_specific: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ArrivalResult {
    Found(NextBus),
    StopNotFound,
    NoArrival,
}

impl ArrivalResult {
    pub fn found(&self) -> Option<&NextBus> {
        match self {
            Self::Found(next) => Some(next),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NearestStop {
    Found { stop: Arc<Stop>, distance_m: f64 },
    /// The catalog has no stops
    Empty,
}

impl Snapshot {
    /// Soonest arrival at `stop_id`, restricted to `route_id` when given.
    pub fn next_bus(&self, stop_id: &StopIdentifier, route_id: Option<&RouteIdentifier>) -> ArrivalResult {
        let Some(entry) = self.board.get(stop_id) else {
            return ArrivalResult::StopNotFound;
        };

        match entry.arrivals.next_arrival(route_id) {
            Some(arrival) => ArrivalResult::Found(NextBus {
                stop: entry.stop.clone(),
                arrival: arrival.clone(),
                route_specific: route_id.is_some(),
            }),
            None => ArrivalResult::NoArrival,
        }
    }

    /// Closest stop to `point` by great-circle distance.
    ///
    /// Scans every stop in ascending stop id order; the first of several
    /// equally close stops wins.
    pub fn nearest_stop(&self, point: Point) -> NearestStop {
        match nearest_by_distance(point, self.catalog.iter(), |stop| stop.location) {
            Some((stop, distance_m)) => NearestStop::Found {
                stop: stop.clone(),
                distance_m,
            },
            None => NearestStop::Empty,
        }
    }
}

/// Answers queries against whatever snapshot is published when asked.
#[derive(Clone)]
pub struct QueryEngine {
    reader: SnapshotReader,
}

impl QueryEngine {
    pub fn new(reader: SnapshotReader) -> Self {
        Self { reader }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.reader.current()
    }

    pub fn next_bus(&self, stop_id: &StopIdentifier, route_id: Option<&RouteIdentifier>) -> ArrivalResult {
        self.reader.current().next_bus(stop_id, route_id)
    }

    pub fn nearest_stop(&self, point: Point) -> NearestStop {
        self.reader.current().nearest_stop(point)
    }
}
