//! Spatial query utilities for distance calculations.
//!
//! Uses the Haversine formula for distances on Earth's surface. Points follow the
//! `geo` convention: `x` is longitude, `y` is latitude.

use geo::{HaversineDistance, Point};

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Exhaustive nearest-neighbour scan.
///
/// Returns the candidate closest to `point` together with its distance in meters.
/// Ties keep the first candidate in iteration order, so a caller iterating in a
/// fixed order gets the same answer every time. Candidates whose distance is not
/// a number are ignored.
pub fn nearest_by_distance<T, I, F>(point: Point, candidates: I, location_of: F) -> Option<(T, f64)>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Point,
{
    let mut best: Option<(T, f64)> = None;

    for candidate in candidates {
        let distance = haversine_distance(point, location_of(&candidate));
        if distance.is_nan() {
            continue;
        }
        match &best {
            Some((_, closest)) if distance >= *closest => {}
            _ => best = Some((candidate, distance)),
        }
    }

    best
}
