//! Per-stop, time-ordered arrival index.

use crate::identifiers::RouteIdentifier;
use crate::models::{Arrival, VehicleStatus};

/// Upcoming arrivals at one stop, soonest first.
///
/// Entries are kept sorted by arrival time. Entries with equal arrival times
/// stay in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrivalIndex {
    arrivals: Vec<Arrival>,
}

impl ArrivalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert before the first entry that does not arrive earlier than `arrival`.
    ///
    /// Linear, which is fine for the handful of trips a stop sees in a feed window.
    pub fn insert(&mut self, arrival: Arrival) {
        let position = self
            .arrivals
            .iter()
            .position(|existing| existing.arrival > arrival.arrival)
            .unwrap_or(self.arrivals.len());
        self.arrivals.insert(position, arrival);
    }

    /// Soonest arrival, or the soonest arrival of `route_id` when one is given.
    pub fn next_arrival(&self, route_id: Option<&RouteIdentifier>) -> Option<&Arrival> {
        match route_id {
            Some(route_id) => self.arrivals.iter().find(|a| &a.route_id == route_id),
            None => self.arrivals.first(),
        }
    }

    /// Drop every arrival that has departed before `now` or whose vehicle is no
    /// longer running a scheduled trip. Returns how many were removed.
    pub fn evict_departed<F>(&mut self, now: i64, status_of: F) -> usize
    where
        F: Fn(&Arrival) -> VehicleStatus,
    {
        let before = self.arrivals.len();
        self.arrivals
            .retain(|arrival| !arrival.has_departed(now) && status_of(arrival).is_scheduled());
        before - self.arrivals.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arrival> {
        self.arrivals.iter()
    }

    pub fn as_slice(&self) -> &[Arrival] {
        &self.arrivals
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }
}
