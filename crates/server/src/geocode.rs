//! Address lookup against a Nominatim instance.

use std::future::Future;
use std::pin::Pin;

use geo::Point;
use nextbus_transit::{FetchError, Geocoder};
use serde::Deserialize;
use tracing::debug;

const USER_AGENT: &str = concat!("nextbus-server/", env!("CARGO_PKG_VERSION"));

pub struct NominatimGeocoder {
    client: reqwest::Client,
    search_url: String,
}

/// One search hit. Nominatim sends coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            search_url: format!("{}/search", base_url.trim_end_matches('/')),
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode<'a>(
        &'a self,
        address: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Point>, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(&self.search_url)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: self.search_url.clone(),
                    status: status.as_u16(),
                });
            }

            let places: Vec<Place> = response.json().await?;
            let point = first_point(&places);
            debug!(address, found = point.is_some(), "geocoded address");
            Ok(point)
        })
    }
}

fn first_point(places: &[Place]) -> Option<Point> {
    let place = places.first()?;
    let latitude: f64 = place.lat.parse().ok()?;
    let longitude: f64 = place.lon.parse().ok()?;
    // "NaN" and "inf" parse as floats
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    Some(Point::new(longitude, latitude))
}
