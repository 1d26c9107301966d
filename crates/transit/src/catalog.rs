//! Static stop catalog.
//!
//! The catalog is read from a `stops.txt` style table: a header line followed by
//! comma-delimited records where field 0 is the stop id, field 2 the stop name and
//! fields 4 and 5 the latitude and longitude.
//!
//! Only records whose stop id is made of ASCII digits are stops. Reading ends at
//! the first record that is not, which is how the provider's file marks the end of
//! its stop rows. A provider that interleaves other rows, or starts issuing
//! non-numeric stop ids, will silently lose every stop after that row.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use geo::Point;
use tracing::{debug, info};

use crate::identifiers::StopIdentifier;
use crate::models::LoadError;

const FIELD_ID: usize = 0;
const FIELD_NAME: usize = 2;
const FIELD_LAT: usize = 4;
const FIELD_LON: usize = 5;

/// A boarding location. Immutable for the lifetime of the catalog that holds it.
#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    pub id: StopIdentifier,
    pub name: Arc<str>,
    /// `x` is longitude, `y` is latitude
    pub location: Point,
}

impl Stop {
    pub fn new(id: impl Into<StopIdentifier>, name: impl AsRef<str>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.as_ref().into(),
            location: Point::new(longitude, latitude),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }
}

/// Every known stop, iterated in ascending stop id order.
///
/// Cheap to share: stops are held behind `Arc`.
#[derive(Clone, Debug, Default)]
pub struct StopCatalog {
    stops: BTreeMap<StopIdentifier, Arc<Stop>>,
}

impl StopCatalog {
    /// Parse a catalog from a header-led, comma-delimited source.
    pub fn load<R: Read>(source: R) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let mut stops = BTreeMap::new();
        for record in reader.records() {
            let record = record?;
            let id = record.get(FIELD_ID).unwrap_or_default();
            if !is_stop_id(id) {
                debug!(first_field = id, "stop rows ended");
                break;
            }

            let stop = parse_stop(id, &record)?;
            stops.insert(stop.id.clone(), Arc::new(stop));
        }

        if stops.is_empty() {
            return Err(LoadError::NoStops);
        }

        info!(stops = stops.len(), "loaded stop catalog");
        Ok(Self { stops })
    }

    pub fn load_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path)?;
        Self::load(file)
    }

    /// Build a catalog from already-parsed stops. Later duplicates replace earlier ones.
    pub fn from_stops(stops: impl IntoIterator<Item = Stop>) -> Self {
        Self {
            stops: stops
                .into_iter()
                .map(|stop| (stop.id.clone(), Arc::new(stop)))
                .collect(),
        }
    }

    pub fn get(&self, id: &StopIdentifier) -> Option<&Arc<Stop>> {
        self.stops.get(id)
    }

    pub fn contains(&self, id: &StopIdentifier) -> bool {
        self.stops.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Stop>> {
        self.stops.values()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

fn is_stop_id(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

fn parse_stop(id: &str, record: &csv::StringRecord) -> Result<Stop, LoadError> {
    let field = |index: usize, field: &'static str| {
        record.get(index).ok_or_else(|| LoadError::MissingField {
            stop_id: id.to_string(),
            field,
        })
    };

    let name = field(FIELD_NAME, "stop_name")?;
    let lat_text = field(FIELD_LAT, "stop_lat")?;
    let lon_text = field(FIELD_LON, "stop_lon")?;

    let invalid = || LoadError::InvalidCoordinate {
        stop_id: id.to_string(),
        latitude: lat_text.to_string(),
        longitude: lon_text.to_string(),
    };

    let latitude: f64 = lat_text.parse().map_err(|_| invalid())?;
    let longitude: f64 = lon_text.parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid());
    }

    Ok(Stop::new(id, name, latitude, longitude))
}
