//! Human-readable answers, phrased the way riders have always seen them.

use nextbus_transit::{ARRIVING_NOW, Arrival, Eta, Stop, render};

pub const NOT_FOUND: &str = "I couldn't find a bus for that stop! There must have been a mistake in the stop number, \
                             the route number, or there are no more buses running :o";

pub const UNRESOLVED_ADDRESS: &str = "Something went wrong! It's probably an invalid address, or I'm out of it today. \
                                      You should try again with different wording or a different address!";

pub const NO_STOPS: &str = "There are no bus stops loaded right now. Please try again later!";

pub fn next_bus(stop: &Stop, arrival: &Arrival, route_specific: bool, eta: &Eta) -> String {
    if eta.is_now() {
        return ARRIVING_NOW.to_string();
    }

    let opening = if route_specific {
        format!(
            "The next bus #{} will arrive at stop #{} ({}) in ",
            arrival.route_id, stop.id, stop.name
        )
    } else {
        format!(
            "The next bus at stop #{} ({}) is bus #{} arriving in ",
            stop.id, stop.name, arrival.route_id
        )
    };
    opening + &render(eta)
}

pub fn nearest_stop(stop: &Stop, distance_m: f64) -> String {
    format!(
        "Your closest bus stop is stop #{} ({}), about {} meters away.",
        stop.id,
        stop.name,
        distance_m.trunc() as u64
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nextbus_transit::decompose;

    fn stop() -> Stop {
        Stop::new("1123", "University / Phillip", 43.4722, -80.5449)
    }

    #[test]
    fn test_route_specific_phrasing() {
        let message = next_bus(&stop(), &Arrival::new("201", 0, 0), true, &decompose(90));
        assert_eq!(
            message,
            "The next bus #201 will arrive at stop #1123 (University / Phillip) in 1 minute and 30 seconds. Better hurry up!"
        );
    }

    #[test]
    fn test_any_route_phrasing() {
        let message = next_bus(&stop(), &Arrival::new("7", 0, 0), false, &decompose(3661));
        assert_eq!(
            message,
            "The next bus at stop #1123 (University / Phillip) is bus #7 arriving in 1 hour and 1 minute and 1 second. Better hurry up!"
        );
    }

    #[test]
    fn test_arriving_now() {
        assert_eq!(next_bus(&stop(), &Arrival::new("7", 0, 0), false, &decompose(0)), ARRIVING_NOW);
    }

    #[test]
    fn test_nearest_stop_truncates_distance() {
        assert_eq!(
            nearest_stop(&stop(), 33.9),
            "Your closest bus stop is stop #1123 (University / Phillip), about 33 meters away."
        );
    }
}
