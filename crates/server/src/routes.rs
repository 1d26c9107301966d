use std::sync::Arc;

use api_types::{
    ArrivalSummary, EtaParts, NearestStopResponse, NextBusResponse, QueryStatus, StatusResponse, StopSummary,
};
use axum::{Json, Router};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use geo::Point;
use nextbus_transit::{
    ArrivalResult, CycleReport, Eta, Geocoder, NearestStop, QueryEngine, RouteIdentifier, Snapshot, Stop,
    StopIdentifier,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::messages;

#[derive(Clone)]
pub struct AppState {
    pub engine: QueryEngine,
    pub geocoder: Option<Arc<dyn Geocoder>>,
    /// Epoch seconds used for ETAs
    pub clock: fn() -> i64,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/next-bus", get(next_bus))
        .route("/nearest-stop", get(nearest_stop))
        .route("/status", get(status))
        .route("/health", get(health))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct NextBusParams {
    stop: String,
    route: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearestStopParams {
    lat: Option<f64>,
    lon: Option<f64>,
    address: Option<String>,
    route: Option<String>,
}

#[derive(Serialize)]
struct StatusBody {
    #[serde(flatten)]
    status: StatusResponse,
    last_cycle: CycleReport,
}

async fn next_bus(State(state): State<AppState>, Query(params): Query<NextBusParams>) -> Json<NextBusResponse> {
    let snapshot = state.engine.snapshot();
    let route = route_filter(params.route.as_deref());
    Json(answer_next_bus(
        &snapshot,
        &StopIdentifier::new(params.stop.trim()),
        route.as_ref(),
        (state.clock)(),
    ))
}

async fn nearest_stop(State(state): State<AppState>, Query(params): Query<NearestStopParams>) -> Response {
    let point = match (params.lat, params.lon, params.address.as_deref()) {
        (Some(lat), Some(lon), _) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return (StatusCode::BAD_REQUEST, "lat/lon out of range").into_response();
            }
            Point::new(lon, lat)
        }
        (None, None, Some(address)) => {
            let Some(geocoder) = &state.geocoder else {
                return (StatusCode::BAD_REQUEST, "address lookup is not configured").into_response();
            };
            match geocoder.geocode(address).await {
                Ok(Some(point)) if point.x().is_finite() && point.y().is_finite() => point,
                Ok(_) => return Json(unresolved_address()).into_response(),
                Err(err) => {
                    warn!(error = %err, "geocoding failed");
                    return Json(unresolved_address()).into_response();
                }
            }
        }
        _ => return (StatusCode::BAD_REQUEST, "expected lat and lon, or address").into_response(),
    };

    let snapshot = state.engine.snapshot();
    let route = route_filter(params.route.as_deref());

    let response = match snapshot.nearest_stop(point) {
        NearestStop::Found { stop, distance_m } => {
            let next_bus = answer_next_bus(&snapshot, &stop.id, route.as_ref(), (state.clock)());
            NearestStopResponse {
                status: QueryStatus::Found,
                stop: Some(stop_summary(&stop)),
                distance_m: Some(distance_m),
                message: format!("{}\n{}", messages::nearest_stop(&stop, distance_m), next_bus.message),
                next_bus: Some(next_bus),
            }
        }
        NearestStop::Empty => NearestStopResponse {
            status: QueryStatus::Empty,
            stop: None,
            distance_m: None,
            next_bus: None,
            message: messages::NO_STOPS.to_string(),
        },
    };
    Json(response).into_response()
}

async fn status(State(state): State<AppState>) -> Json<StatusBody> {
    let snapshot = state.engine.snapshot();
    Json(StatusBody {
        status: StatusResponse {
            version: snapshot.version,
            built_at: snapshot.built_at,
            stops: snapshot.catalog.len(),
            arrivals: snapshot.board.arrival_count(),
            vehicles: snapshot.registry.len(),
        },
        last_cycle: snapshot.report.clone(),
    })
}

async fn health() -> &'static str {
    "OK"
}

/// An absent or blank route means any route.
fn route_filter(route: Option<&str>) -> Option<RouteIdentifier> {
    route.map(str::trim).filter(|route| !route.is_empty()).map(RouteIdentifier::new)
}

fn answer_next_bus(
    snapshot: &Snapshot,
    stop_id: &StopIdentifier,
    route: Option<&RouteIdentifier>,
    now: i64,
) -> NextBusResponse {
    match snapshot.next_bus(stop_id, route) {
        ArrivalResult::Found(next) => {
            let eta = Eta::until(next.arrival.arrival, now);
            NextBusResponse {
                status: QueryStatus::Found,
                stop: Some(stop_summary(&next.stop)),
                message: messages::next_bus(&next.stop, &next.arrival, next.route_specific, &eta),
                arrival: Some(ArrivalSummary {
                    route: next.arrival.route_id.to_string(),
                    trip: next.arrival.trip_id.as_ref().map(ToString::to_string),
                    arrival: next.arrival.arrival,
                    departure: next.arrival.departure,
                    eta: EtaParts {
                        hours: eta.hours,
                        minutes: eta.minutes,
                        seconds: eta.seconds,
                        total_seconds: eta.total_seconds(),
                    },
                }),
            }
        }
        ArrivalResult::StopNotFound => NextBusResponse {
            status: QueryStatus::StopNotFound,
            stop: None,
            arrival: None,
            message: messages::NOT_FOUND.to_string(),
        },
        ArrivalResult::NoArrival => NextBusResponse {
            status: QueryStatus::NoArrival,
            stop: snapshot.catalog.get(stop_id).map(|stop| stop_summary(stop)),
            arrival: None,
            message: messages::NOT_FOUND.to_string(),
        },
    }
}

fn unresolved_address() -> NearestStopResponse {
    NearestStopResponse {
        status: QueryStatus::UnresolvedAddress,
        stop: None,
        distance_m: None,
        next_bus: None,
        message: messages::UNRESOLVED_ADDRESS.to_string(),
    }
}

fn stop_summary(stop: &Stop) -> StopSummary {
    StopSummary {
        id: stop.id.to_string(),
        name: stop.name.to_string(),
        latitude: stop.latitude(),
        longitude: stop.longitude(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use nextbus_transit::{Arrival, FetchError, SnapshotPublisher, SnapshotReader, StopCatalog};
    use serde_json::Value;
    use std::future::Future;
    use std::pin::Pin;
    use tower::ServiceExt;

    const NOW: i64 = 1_700_000_000;

    struct FixedGeocoder;

    impl Geocoder for FixedGeocoder {
        fn geocode<'a>(
            &'a self,
            address: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Option<Point>, FetchError>> + Send + 'a>> {
            Box::pin(async move {
                match address {
                    "200 University Ave W" => Ok(Some(Point::new(-80.5449, 43.4725))),
                    "null island" => Ok(Some(Point::new(f64::NAN, f64::NAN))),
                    "down" => Err(FetchError::Status {
                        url: "http://geocoder".to_string(),
                        status: 503,
                    }),
                    _ => Ok(None),
                }
            })
        }
    }

    fn reader(catalog: StopCatalog) -> (SnapshotPublisher, SnapshotReader) {
        let mut snapshot = Snapshot::from_catalog(catalog, NOW);
        if let Some(index) = snapshot.board.arrivals_mut(&StopIdentifier::new("1123")) {
            index.insert(Arrival::new("201", NOW + 90, NOW + 100).with_trip("t201"));
            index.insert(Arrival::new("7", NOW + 600, NOW + 610));
        }
        SnapshotPublisher::new(snapshot)
    }

    fn app_with(catalog: StopCatalog) -> Router {
        let (_publisher, reader) = reader(catalog);
        create_router(AppState {
            engine: QueryEngine::new(reader),
            geocoder: Some(Arc::new(FixedGeocoder)),
            clock: || NOW,
        })
    }

    fn app() -> Router {
        app_with(StopCatalog::from_stops(vec![
            Stop::new("1000", "Charles Terminal", 43.448, -80.489),
            Stop::new("1123", "University / Phillip", 43.4722, -80.5449),
        ]))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app.oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_next_bus_any_route() {
        let (status, body) = get_json(app(), "/next-bus?stop=1123").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "found");
        assert_eq!(body["arrival"]["route"], "201");
        assert_eq!(body["arrival"]["trip"], "t201");
        assert_eq!(body["arrival"]["eta"]["total_seconds"], 90);
        assert_eq!(
            body["message"],
            "The next bus at stop #1123 (University / Phillip) is bus #201 arriving in 1 minute and 30 seconds. Better hurry up!"
        );
    }

    #[tokio::test]
    async fn test_next_bus_for_route() {
        let (_, body) = get_json(app(), "/next-bus?stop=1123&route=7").await;

        assert_eq!(body["arrival"]["route"], "7");
        assert_eq!(
            body["message"],
            "The next bus #7 will arrive at stop #1123 (University / Phillip) in 10 minutes."
        );
    }

    #[tokio::test]
    async fn test_next_bus_not_found() {
        let (_, body) = get_json(app(), "/next-bus?stop=9999").await;
        assert_eq!(body["status"], "stop_not_found");
        assert_eq!(body["message"], messages::NOT_FOUND);

        let (_, body) = get_json(app(), "/next-bus?stop=1000").await;
        assert_eq!(body["status"], "no_arrival");
        assert_eq!(body["stop"]["name"], "Charles Terminal");

        let (_, body) = get_json(app(), "/next-bus?stop=1123&route=12").await;
        assert_eq!(body["status"], "no_arrival");
    }

    #[tokio::test]
    async fn test_next_bus_requires_stop() {
        let (status, _) = get_json(app(), "/next-bus").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_nearest_stop_by_coordinates() {
        let (status, body) = get_json(app(), "/nearest-stop?lat=43.4725&lon=-80.5449").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "found");
        assert_eq!(body["stop"]["id"], "1123");
        assert!(body["distance_m"].as_f64().unwrap() < 50.0);
        assert_eq!(body["next_bus"]["arrival"]["route"], "201");

        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("Your closest bus stop is stop #1123 (University / Phillip), about 33 meters away.\n"));
        assert!(message.ends_with("is bus #201 arriving in 1 minute and 30 seconds. Better hurry up!"));
    }

    #[tokio::test]
    async fn test_nearest_stop_by_address() {
        let (_, body) = get_json(app(), "/nearest-stop?address=200%20University%20Ave%20W").await;
        assert_eq!(body["stop"]["id"], "1123");

        let (status, body) = get_json(app(), "/nearest-stop?address=nowhere").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "unresolved_address");
        assert_eq!(body["message"], messages::UNRESOLVED_ADDRESS);

        let (_, body) = get_json(app(), "/nearest-stop?address=down").await;
        assert_eq!(body["status"], "unresolved_address");
    }

    #[tokio::test]
    async fn test_nearest_stop_geocoded_nan() {
        let (status, body) = get_json(app(), "/nearest-stop?address=null%20island").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "unresolved_address");
    }

    #[tokio::test]
    async fn test_nearest_stop_rejects_bad_input() {
        let (status, _) = get_json(app(), "/nearest-stop?lat=91&lon=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(app(), "/nearest-stop?lat=43.4").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_nearest_stop_empty_catalog() {
        let (_, body) = get_json(app_with(StopCatalog::default()), "/nearest-stop?lat=0&lon=0").await;
        assert_eq!(body["status"], "empty");
    }

    #[tokio::test]
    async fn test_status_and_health() {
        let (_, body) = get_json(app(), "/status").await;
        assert_eq!(body["version"], 1);
        assert_eq!(body["stops"], 2);
        assert_eq!(body["arrivals"], 2);
        assert_eq!(body["last_cycle"]["catalog"]["state"], "fresh");

        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }
}
