//! Eviction of departed and no-longer-scheduled arrivals.

use tracing::debug;

use crate::board::StopBoard;
use crate::vehicles::VehicleRegistry;

/// Remove, at every stop, arrivals that left before `now` or whose vehicle is
/// no longer on a scheduled trip. Returns the number of arrivals removed.
pub fn sweep(board: &mut StopBoard, registry: &VehicleRegistry, now: i64) -> usize {
    let evicted: usize = board
        .iter_mut()
        .map(|entry| entry.arrivals.evict_departed(now, |arrival| registry.status_for(arrival)))
        .sum();

    debug!(evicted, remaining = board.arrival_count(), "swept stop board");
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Stop, StopCatalog};
    use crate::identifiers::StopIdentifier;
    use crate::models::Arrival;
    use crate::realtime::testing::*;

    #[test]
    fn test_sweep_every_stop() {
        let catalog = StopCatalog::from_stops(vec![
            Stop::new("1", "One", 43.0, -80.0),
            Stop::new("2", "Two", 43.1, -80.1),
        ]);
        let mut board = StopBoard::from_catalog(&catalog);
        let one = StopIdentifier::new("1");
        let two = StopIdentifier::new("2");

        let index = board.arrivals_mut(&one).unwrap();
        index.insert(Arrival::new("R1", 100, 120).with_trip("t1"));
        index.insert(Arrival::new("R2", 150, 250).with_trip("t2"));
        let index = board.arrivals_mut(&two).unwrap();
        index.insert(Arrival::new("R3", 300, 320).with_trip("t3"));
        index.insert(Arrival::new("R4", 310, 330).with_trip("t4"));

        // t3 has been cancelled, t4 is running normally
        let registry = VehicleRegistry::from_feed(&feed(vec![
            vehicle_entity("v3", "t3", "R3", Some(3), Some(1)),
            vehicle_entity("v4", "t4", "R4", None, Some(1)),
        ]));

        let evicted = sweep(&mut board, &registry, 200);

        assert_eq!(evicted, 2);
        let remaining: Vec<&str> = board
            .iter()
            .flat_map(|entry| entry.arrivals.iter())
            .map(|a| a.route_id.as_str())
            .collect();
        assert_eq!(remaining, vec!["R2", "R4"]);
    }
}
