//! Time-until-arrival computation and rendering.

use std::fmt;

/// Sentence used instead of a duration once the bus is due.
pub const ARRIVING_NOW: &str = "The bus should be arriving right now! Look out for it!";

const HURRY_UP: &str = " Better hurry up!";

/// Current time in epoch seconds
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Seconds from `now` until `arrival`, never negative.
pub fn seconds_until(arrival: i64, now: i64) -> u64 {
    u64::try_from(arrival.saturating_sub(now)).unwrap_or(0)
}

/// A duration split into hours, minutes and seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Eta {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

pub fn decompose(total_seconds: u64) -> Eta {
    Eta {
        hours: total_seconds / 3600,
        minutes: (total_seconds / 60) % 60,
        seconds: total_seconds % 60,
    }
}

impl Eta {
    pub fn until(arrival: i64, now: i64) -> Self {
        decompose(seconds_until(arrival, now))
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }

    pub fn is_now(&self) -> bool {
        self.total_seconds() == 0
    }

    /// The minutes component is at most one. Hours are not considered.
    pub fn is_imminent(&self) -> bool {
        !self.is_now() && self.minutes <= 1
    }
}

/// Render an ETA as text, e.g. `1 minute and 30 seconds. Better hurry up!`.
///
/// Zero components are left out and the rest are joined with "and". A zero
/// ETA renders [`ARRIVING_NOW`].
pub fn render(eta: &Eta) -> String {
    if eta.is_now() {
        return ARRIVING_NOW.to_string();
    }

    let parts: Vec<String> = [(eta.hours, "hour"), (eta.minutes, "minute"), (eta.seconds, "second")]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, noun)| {
            if count == 1 {
                format!("{count} {noun}")
            } else {
                format!("{count} {noun}s")
            }
        })
        .collect();

    let mut text = parts.join(" and ");
    text.push('.');

    if eta.is_imminent() {
        text.push_str(HURRY_UP);
    }
    text
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_until() {
        assert_eq!(seconds_until(1_000, 900), 100);
        assert_eq!(seconds_until(900, 1_000), 0);
        assert_eq!(seconds_until(1_000, 1_000), 0);
        assert_eq!(seconds_until(i64::MIN, i64::MAX), 0);
    }

    #[test]
    fn test_decompose() {
        assert_eq!(decompose(90), Eta { hours: 0, minutes: 1, seconds: 30 });
        assert_eq!(decompose(3661), Eta { hours: 1, minutes: 1, seconds: 1 });
        assert_eq!(decompose(7325), Eta { hours: 2, minutes: 2, seconds: 5 });
        assert_eq!(decompose(0), Eta::default());
    }

    #[test]
    fn test_render_now() {
        let now = 1_700_000_000;
        assert_eq!(render(&decompose(seconds_until(now, now))), ARRIVING_NOW);
        assert_eq!(render(&Eta::until(now - 30, now)), ARRIVING_NOW);
    }

    #[test]
    fn test_render_components() {
        assert_eq!(render(&decompose(90)), "1 minute and 30 seconds. Better hurry up!");
        assert_eq!(render(&decompose(7325)), "2 hours and 2 minutes and 5 seconds.");
        assert_eq!(render(&decompose(600)), "10 minutes.");
        assert_eq!(render(&decompose(3605)), "1 hour and 5 seconds. Better hurry up!");
    }

    #[test]
    fn test_render_hurry() {
        assert_eq!(render(&decompose(1)), "1 second. Better hurry up!");
        assert_eq!(render(&decompose(119)), "1 minute and 59 seconds. Better hurry up!");
        assert!(!render(&decompose(120)).contains("hurry"));
        assert!(!render(&decompose(7325)).contains("hurry"));
    }

    #[test]
    fn test_render_hurry_ignores_hours() {
        assert_eq!(render(&decompose(3661)), "1 hour and 1 minute and 1 second. Better hurry up!");
        assert_eq!(render(&decompose(3600)), "1 hour. Better hurry up!");
        assert_eq!(render(&decompose(3660)), "1 hour and 1 minute. Better hurry up!");
    }
}
