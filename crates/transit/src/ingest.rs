//! Trip-update ingestion into the stop board.

use std::collections::BTreeSet;

use gtfs_realtime::trip_descriptor::ScheduleRelationship as TripRelationship;
use gtfs_realtime::trip_update::stop_time_update::ScheduleRelationship;
use gtfs_realtime::trip_update::StopTimeUpdate;
use tracing::{debug, info};

use crate::board::StopBoard;
use crate::identifiers::*;
use crate::models::Arrival;
use crate::realtime::FeedMessage;
use crate::vehicles::VehicleRegistry;

/// How many distinct unknown stop ids a report keeps for logging
const UNKNOWN_STOP_SAMPLE: usize = 20;

/// What one trip-update snapshot contributed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IngestionReport {
    pub entities: usize,
    pub trip_updates: usize,
    pub accepted: usize,
    /// Skipped, no-data and unscheduled stop-time updates
    pub not_scheduled: usize,
    pub canceled_trips: usize,
    pub unknown_stops: usize,
    /// First few distinct unknown stop ids, in ascending order
    pub unknown_stop_ids: Vec<StopIdentifier>,
    pub missing_stop: usize,
    pub missing_route: usize,
    pub missing_time: usize,
}

/// Merge every scheduled stop-time update in `feed` into `board`.
///
/// Updates for stops outside the catalog are counted and skipped; they never
/// stop the rest of the snapshot from being processed. The route comes from the
/// trip descriptor, or from the vehicle running the trip when the descriptor
/// leaves it out.
pub fn ingest_trip_updates(feed: &FeedMessage, board: &mut StopBoard, registry: &VehicleRegistry) -> IngestionReport {
    let mut report = IngestionReport {
        entities: feed.entity.len(),
        ..Default::default()
    };
    let mut unknown = BTreeSet::new();

    for entity in &feed.entity {
        if entity.is_deleted == Some(true) {
            continue;
        }
        let Some(trip_update) = &entity.trip_update else {
            continue;
        };
        report.trip_updates += 1;

        let trip = &trip_update.trip;
        if trip.schedule_relationship == Some(TripRelationship::Canceled as i32) {
            report.canceled_trips += 1;
            continue;
        }

        let trip_id = trip
            .trip_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(TripIdentifier::new);

        let route_id = trip
            .route_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(RouteIdentifier::new)
            .or_else(|| {
                trip_id
                    .as_ref()
                    .and_then(|id| registry.get(id))
                    .and_then(|vehicle| vehicle.route_id.clone())
            });

        for update in &trip_update.stop_time_update {
            if !is_scheduled(update) {
                report.not_scheduled += 1;
                continue;
            }

            let Some(stop_id) = update.stop_id.as_deref().filter(|id| !id.is_empty()) else {
                report.missing_stop += 1;
                continue;
            };

            let Some(route_id) = &route_id else {
                report.missing_route += 1;
                continue;
            };

            let Some((arrival_time, departure_time)) = stop_times(update) else {
                report.missing_time += 1;
                continue;
            };

            let stop_id = StopIdentifier::new(stop_id);
            let Some(arrivals) = board.arrivals_mut(&stop_id) else {
                debug!(stop_id = %stop_id, "stop not in catalog");
                report.unknown_stops += 1;
                if unknown.len() < UNKNOWN_STOP_SAMPLE {
                    unknown.insert(stop_id);
                }
                continue;
            };

            arrivals.insert(Arrival {
                route_id: route_id.clone(),
                trip_id: trip_id.clone(),
                arrival: arrival_time,
                departure: departure_time,
            });
            report.accepted += 1;
        }
    }

    report.unknown_stop_ids = unknown.into_iter().collect();

    info!(
        trip_updates = report.trip_updates,
        accepted = report.accepted,
        not_scheduled = report.not_scheduled,
        unknown_stops = report.unknown_stops,
        "ingested trip updates"
    );
    report
}

/// Unset on the wire means scheduled.
fn is_scheduled(update: &StopTimeUpdate) -> bool {
    update.schedule_relationship.unwrap_or(ScheduleRelationship::Scheduled as i32)
        == ScheduleRelationship::Scheduled as i32
}

/// Arrival and departure epochs, each falling back to the other.
fn stop_times(update: &StopTimeUpdate) -> Option<(i64, i64)> {
    let arrival = update.arrival.as_ref().and_then(|event| event.time);
    let departure = update.departure.as_ref().and_then(|event| event.time);

    match (arrival, departure) {
        (Some(arrival), Some(departure)) => Some((arrival, departure)),
        (Some(arrival), None) => Some((arrival, arrival)),
        (None, Some(departure)) => Some((departure, departure)),
        (None, None) => None,
    }
}
