//! Vehicle registry built from a vehicle-position snapshot.

use std::collections::HashMap;

use geo::Point;
use tracing::debug;

use crate::identifiers::*;
use crate::models::{Arrival, ParseError, StopStatus, Vehicle, VehicleStatus};
use crate::realtime::{decode_feed, FeedMessage};

/// Vehicles keyed by the trip they are running.
///
/// A registry is always built from one complete snapshot and replaces the
/// previous one, so vehicles missing from the newest snapshot disappear.
#[derive(Clone, Debug, Default)]
pub struct VehicleRegistry {
    vehicles: HashMap<TripIdentifier, Vehicle>,
}

impl VehicleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a vehicle-position snapshot and build a registry from it.
    pub fn ingest(bytes: &[u8], max_bytes: usize) -> Result<Self, ParseError> {
        let feed = decode_feed(bytes, max_bytes)?;
        Ok(Self::from_feed(&feed))
    }

    /// Build a registry from an already-decoded snapshot.
    ///
    /// Entities without a vehicle record, or whose vehicle has no trip id, are
    /// skipped. A later entity for the same trip replaces an earlier one.
    pub fn from_feed(feed: &FeedMessage) -> Self {
        let mut vehicles = HashMap::new();
        let mut skipped = 0usize;

        for entity in &feed.entity {
            if entity.is_deleted == Some(true) {
                continue;
            }
            let Some(position) = &entity.vehicle else {
                continue;
            };
            match vehicle_from_position(position) {
                Some(vehicle) => {
                    vehicles.insert(vehicle.trip_id.clone(), vehicle);
                }
                None => skipped += 1,
            }
        }

        debug!(vehicles = vehicles.len(), skipped, "built vehicle registry");
        Self { vehicles }
    }

    pub fn insert(&mut self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.trip_id.clone(), vehicle);
    }

    pub fn get(&self, trip_id: &TripIdentifier) -> Option<&Vehicle> {
        self.vehicles.get(trip_id)
    }

    /// Status of the vehicle running `trip_id`, if one is reporting.
    pub fn status_of(&self, trip_id: &TripIdentifier) -> Option<VehicleStatus> {
        self.vehicles.get(trip_id).map(|vehicle| vehicle.status)
    }

    /// Status that decides whether `arrival` is still offered.
    ///
    /// A trip with no reporting vehicle has not started and counts as scheduled.
    pub fn status_for(&self, arrival: &Arrival) -> VehicleStatus {
        arrival
            .trip_id
            .as_ref()
            .and_then(|trip_id| self.status_of(trip_id))
            .unwrap_or(VehicleStatus::Scheduled)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

fn vehicle_from_position(position: &gtfs_realtime::VehiclePosition) -> Option<Vehicle> {
    let trip = position.trip.as_ref()?;
    let trip_id = trip.trip_id.as_deref().filter(|id| !id.is_empty())?;

    let location = position
        .position
        .as_ref()
        .filter(|p| p.latitude.is_finite() && p.longitude.is_finite())
        .map(|p| Point::new(f64::from(p.longitude), f64::from(p.latitude)));

    Some(Vehicle {
        trip_id: TripIdentifier::new(trip_id),
        vehicle_id: position
            .vehicle
            .as_ref()
            .and_then(|v| v.id.as_deref())
            .map(VehicleIdentifier::new),
        route_id: trip
            .route_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(RouteIdentifier::new),
        stop_sequence: position.current_stop_sequence,
        position: location,
        status: VehicleStatus::from_wire(trip.schedule_relationship),
        stop_status: StopStatus::from_wire(position.current_status),
    })
}
