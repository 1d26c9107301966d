//! Refresh cycles: fetch, parse, ingest, sweep and publish.
//!
//! The three sources are fetched concurrently, each under its own timeout. A
//! source that fails leaves the previous snapshot's data for it in place, so a
//! bad cycle still publishes a complete, valid snapshot.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::board::StopBoard;
use crate::catalog::StopCatalog;
use crate::eta::now_epoch;
use crate::ingest::{ingest_trip_updates, IngestionReport};
use crate::models::{FetchError, LoadError, ParseError};
use crate::network::FeedFetcher;
use crate::realtime::{decode_feed, FeedMessage, DEFAULT_MAX_FEED_BYTES};
use crate::snapshot::{Snapshot, SnapshotPublisher};
use crate::sweep::sweep;
use crate::vehicles::VehicleRegistry;

/// Where the static stop table comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogSource {
    Path(PathBuf),
    Url(String),
}

#[derive(Clone, Debug)]
pub struct FeedSources {
    pub catalog: CatalogSource,
    pub vehicle_positions: String,
    pub trip_updates: String,
}

#[derive(Clone, Debug)]
pub struct RefreshOptions {
    /// Limit for each individual fetch
    pub fetch_timeout: Duration,
    pub max_feed_bytes: usize,
    /// How long a loaded catalog is used before it is fetched again
    pub catalog_refresh: Duration,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            max_feed_bytes: DEFAULT_MAX_FEED_BYTES,
            catalog_refresh: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// What a cycle did with one source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "state", content = "reason", rename_all = "snake_case"))]
pub enum SourceOutcome {
    #[default]
    Fresh,
    /// Not due this cycle; the previous data was reused
    Reused,
    /// Fetching or parsing failed; previous data (if any) was kept
    Stale(String),
}

impl SourceOutcome {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CycleReport {
    pub catalog: SourceOutcome,
    pub vehicles: SourceOutcome,
    pub trip_updates: SourceOutcome,
    /// Present when the trip-update snapshot was ingested
    pub ingestion: Option<IngestionReport>,
    pub evicted: usize,
}

#[derive(Debug, thiserror::Error)]
enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Builds snapshots from the configured sources. Holds the only catalog clock,
/// so one refresher should drive one publisher.
pub struct Refresher<F> {
    fetcher: F,
    sources: FeedSources,
    options: RefreshOptions,
    catalog_loaded_at: Option<i64>,
}

impl<F: FeedFetcher> Refresher<F> {
    pub fn new(fetcher: F, sources: FeedSources, options: RefreshOptions) -> Self {
        Self {
            fetcher,
            sources,
            options,
            catalog_loaded_at: None,
        }
    }

    /// Build the snapshot that follows `previous`.
    ///
    /// Fails only when there is no previous snapshot and the catalog cannot be
    /// loaded.
    pub async fn build(&mut self, previous: Option<&Snapshot>, now: i64) -> Result<Snapshot, LoadError> {
        let catalog_due = match (previous, self.catalog_loaded_at) {
            (Some(_), Some(loaded_at)) => {
                now.saturating_sub(loaded_at) >= secs(self.options.catalog_refresh)
            }
            _ => true,
        };

        let (catalog, vehicles, trips) = tokio::join!(
            async {
                if catalog_due {
                    Some(self.fetch_catalog().await)
                } else {
                    None
                }
            },
            self.fetch_feed(&self.sources.vehicle_positions),
            self.fetch_feed(&self.sources.trip_updates),
        );

        let mut report = CycleReport::default();

        let catalog = match (catalog, previous) {
            (Some(Ok(catalog)), _) => {
                self.catalog_loaded_at = Some(now);
                Arc::new(catalog)
            }
            (Some(Err(err)), Some(previous)) => {
                warn!(error = %err, "keeping previous stop catalog");
                report.catalog = SourceOutcome::Stale(err.to_string());
                previous.catalog.clone()
            }
            (Some(Err(err)), None) => return Err(err),
            (None, Some(previous)) => {
                report.catalog = SourceOutcome::Reused;
                previous.catalog.clone()
            }
            (None, None) => return Err(LoadError::NoStops),
        };

        let registry = match vehicles {
            Ok(feed) => Arc::new(VehicleRegistry::from_feed(&feed)),
            Err(err) => {
                warn!(error = %err, "keeping previous vehicle registry");
                report.vehicles = SourceOutcome::Stale(err.to_string());
                previous.map(|p| p.registry.clone()).unwrap_or_default()
            }
        };

        let mut board = match trips {
            Ok(feed) => {
                let mut board = StopBoard::from_catalog(&catalog);
                report.ingestion = Some(ingest_trip_updates(&feed, &mut board, &registry));
                board
            }
            Err(err) => {
                warn!(error = %err, "keeping previous arrivals");
                report.trip_updates = SourceOutcome::Stale(err.to_string());
                match previous {
                    Some(previous) => StopBoard::carry_forward(&catalog, &previous.board),
                    None => StopBoard::from_catalog(&catalog),
                }
            }
        };

        report.evicted = sweep(&mut board, &registry, now);

        Ok(Snapshot {
            version: previous.map_or(1, |p| p.version + 1),
            built_at: now,
            catalog,
            board,
            registry,
            report,
        })
    }

    /// Build on the published snapshot and publish the result.
    pub async fn run_cycle(&mut self, publisher: &SnapshotPublisher, now: i64) -> Result<CycleReport, LoadError> {
        let previous = publisher.current();
        let snapshot = self.build(Some(&previous), now).await?;
        let report = snapshot.report.clone();

        info!(
            version = snapshot.version,
            stops = snapshot.catalog.len(),
            arrivals = snapshot.board.arrival_count(),
            vehicles = snapshot.registry.len(),
            evicted = report.evicted,
            "published snapshot"
        );
        publisher.publish(snapshot);
        Ok(report)
    }

    /// Run a cycle every `interval` until the task is dropped. The first cycle
    /// runs one interval from now; a slow cycle delays the next one rather than
    /// overlapping it.
    pub async fn run(mut self, publisher: SnapshotPublisher, interval: Duration) {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(err) = self.run_cycle(&publisher, now_epoch()).await {
                error!(error = %err, "refresh cycle failed");
            }
        }
    }

    async fn fetch_catalog(&self) -> Result<StopCatalog, LoadError> {
        let limit = self.options.fetch_timeout;
        let bytes = match &self.sources.catalog {
            CatalogSource::Path(path) => {
                with_timeout(limit, async { tokio::fs::read(path).await.map_err(LoadError::from) }).await?
            }
            CatalogSource::Url(url) => {
                with_timeout(limit, async { self.fetcher.fetch(url).await.map_err(LoadError::from) }).await?
            }
        };
        StopCatalog::load(bytes.as_slice())
    }

    async fn fetch_feed(&self, url: &str) -> Result<FeedMessage, FeedError> {
        let limit = self.options.fetch_timeout;
        let bytes = with_timeout(limit, async { self.fetcher.fetch(url).await.map_err(FeedError::from) }).await?;
        Ok(decode_feed(&bytes, self.options.max_feed_bytes)?)
    }
}

async fn with_timeout<T, E, Fut>(limit: Duration, future: Fut) -> Result<T, E>
where
    E: From<FetchError>,
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(E::from(FetchError::Timeout(limit))),
    }
}

fn secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}
