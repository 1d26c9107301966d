use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::WrapErr;
use nextbus_transit::eta::now_epoch;
use nextbus_transit::{FeedFetcher, Geocoder, HttpFetcher, QueryEngine, Refresher, Snapshot, SnapshotPublisher};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod geocode;
mod messages;
mod routes;

use config::{Config, StartupConfig};
use geocode::NominatimGeocoder;
use routes::AppState;

#[derive(Parser, Debug)]
#[command(
    name = "nextbus-server",
    author,
    version,
    about = "Answer \"when is my bus?\" from live GTFS-Realtime feeds"
)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "NEXTBUS_CONFIG", default_value = "nextbus.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nextbus_server=info,nextbus_transit=info")),
        )
        .init();

    let config = Config::load(&args.config)?;
    info!(config = %args.config.display(), listen = %config.listen, "starting");

    let client = reqwest::Client::builder()
        .user_agent(concat!("nextbus-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .wrap_err("failed to build HTTP client")?;

    let mut refresher = Refresher::new(
        HttpFetcher::new(client.clone()),
        config.sources()?,
        config.refresh_options(),
    );
    let initial = first_snapshot(&mut refresher, &config.startup).await?;
    info!(
        stops = initial.catalog.len(),
        arrivals = initial.board.arrival_count(),
        vehicles = initial.registry.len(),
        "initial snapshot ready"
    );

    let (publisher, reader) = SnapshotPublisher::new(initial);
    let refresh = tokio::spawn(refresher.run(publisher, config.refresh_interval()));

    let geocoder = config
        .geocoder
        .nominatim_url
        .as_deref()
        .map(|url| Arc::new(NominatimGeocoder::new(client.clone(), url)) as Arc<dyn Geocoder>);
    if geocoder.is_none() {
        info!("no geocoder configured, address lookups are disabled");
    }

    let app = routes::create_router(AppState {
        engine: QueryEngine::new(reader),
        geocoder,
        clock: now_epoch,
    });

    let listener = TcpListener::bind(config.listen)
        .await
        .wrap_err_with(|| format!("failed to bind {}", config.listen))?;
    info!(addr = %config.listen, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server failed")?;

    refresh.abort();
    Ok(())
}

/// Build the first snapshot, retrying with exponential backoff until a stop
/// catalog loads or the attempts run out.
async fn first_snapshot<F: FeedFetcher>(
    refresher: &mut Refresher<F>,
    startup: &StartupConfig,
) -> eyre::Result<Snapshot> {
    let mut attempt = 1;
    loop {
        match refresher.build(None, now_epoch()).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(err) if attempt < startup.max_attempts => {
                let delay = startup.backoff(attempt);
                warn!(attempt, error = %err, retry_in = ?delay, "initial load failed");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                return Err(err).wrap_err_with(|| format!("no stop catalog after {attempt} attempts"));
            }
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => error!(error = %err, "failed to listen for shutdown signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nextbus_transit::{CatalogSource, FeedSources, FetchError, RefreshOptions};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicU32, Ordering};

    const STOPS: &str = "stop_id,stop_code,stop_name,stop_desc,stop_lat,stop_lon\n\
                         1123,1123,University / Phillip,,43.4722,-80.5449\n";

    /// Serves the stop table only after `failures` failed catalog fetches.
    struct FlakyFetcher {
        failures: u32,
        calls: AtomicU32,
    }

    impl FeedFetcher for FlakyFetcher {
        fn fetch<'a>(
            &'a self,
            url: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>> {
            Box::pin(async move {
                if url != "mem://stops.txt" {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: 404,
                    });
                }
                if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: 503,
                    });
                }
                Ok(STOPS.as_bytes().to_vec())
            })
        }
    }

    fn refresher(failures: u32) -> Refresher<FlakyFetcher> {
        Refresher::new(
            FlakyFetcher {
                failures,
                calls: AtomicU32::new(0),
            },
            FeedSources {
                catalog: CatalogSource::Url("mem://stops.txt".to_string()),
                vehicle_positions: "mem://vehicles".to_string(),
                trip_updates: "mem://trips".to_string(),
            },
            RefreshOptions::default(),
        )
    }

    fn startup(max_attempts: u32) -> StartupConfig {
        StartupConfig {
            max_attempts,
            initial_backoff_ms: 500,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_retries_until_catalog_loads() {
        let mut refresher = refresher(2);
        let started = tokio::time::Instant::now();

        let snapshot = first_snapshot(&mut refresher, &startup(5)).await.unwrap();

        assert_eq!(snapshot.catalog.len(), 1);
        // 500ms then 1s of backoff
        assert!(started.elapsed() >= std::time::Duration::from_millis(1_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_gives_up() {
        let mut refresher = refresher(u32::MAX);

        let err = first_snapshot(&mut refresher, &startup(3)).await.unwrap_err();
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[test]
    fn test_args() {
        let args = Args::parse_from(["nextbus-server", "--config", "/etc/nextbus.toml"]);
        assert_eq!(args.config, PathBuf::from("/etc/nextbus.toml"));
    }
}
