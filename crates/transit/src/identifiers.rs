//! Feed-assigned identifiers.
//!
//! Stop, route, trip and vehicle ids are opaque strings chosen by the agency.
//! They compare as strings, never as numbers, so the catalog orders stop
//! `"1000"` before `"999"`. Each wraps an `Arc<str>` because the same id is
//! shared by the catalog, the arrival board and the vehicle registry.

use std::fmt;
use std::sync::Arc;

macro_rules! feed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(Arc::from(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(Arc::from(id))
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }
    };
}

feed_id!(
    /// `stop_id` from the stop table, also the user-facing stop number.
    StopIdentifier
);
feed_id!(RouteIdentifier);
feed_id!(TripIdentifier);
feed_id!(VehicleIdentifier);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Stop, StopCatalog};

    #[test]
    fn test_catalog_orders_stops_as_strings() {
        let catalog = StopCatalog::from_stops(vec![
            Stop::new("999", "Kitchener City Hall", 43.451, -80.492),
            Stop::new("2514", "Fairview Park Mall", 43.4242, -80.4393),
            Stop::new("1000", "Charles Terminal", 43.448, -80.489),
        ]);

        let ids: Vec<&str> = catalog.iter().map(|stop| stop.id.as_str()).collect();
        assert_eq!(ids, vec!["1000", "2514", "999"]);
    }

    #[test]
    fn test_lookup_with_fresh_id() {
        let catalog = StopCatalog::from_stops(vec![Stop::new("1123", "University / Phillip", 43.4722, -80.5449)]);

        // A query builds its own id from request text
        let query = StopIdentifier::from(String::from("1123"));
        assert_eq!(catalog.get(&query).map(|stop| &*stop.name), Some("University / Phillip"));
        assert!(!catalog.contains(&StopIdentifier::new("01123")));
    }

    #[test]
    fn test_clones_share_storage() {
        let id = TripIdentifier::new("t201");
        let copy = id.clone();
        assert!(Arc::ptr_eq(&id.0, &copy.0));
    }

    #[test]
    fn test_display_is_raw_id() {
        assert_eq!(RouteIdentifier::new("201").to_string(), "201");
        assert_eq!(format!("stop #{}", StopIdentifier::new("1123")), "stop #1123");
    }
}
