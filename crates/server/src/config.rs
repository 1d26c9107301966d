use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{WrapErr, bail};
use nextbus_transit::realtime::DEFAULT_MAX_FEED_BYTES;
use nextbus_transit::{CatalogSource, FeedSources, RefreshOptions};
use serde::Deserialize;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Server configuration, read from a TOML file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_catalog_refresh")]
    pub catalog_refresh_secs: u64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_feed_bytes")]
    pub max_feed_bytes: usize,
    pub catalog: CatalogConfig,
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub startup: StartupConfig,
}

/// Exactly one of `path` and `url`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
    pub url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedsConfig {
    pub vehicle_positions: String,
    pub trip_updates: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim instance; address lookups are disabled without one
    pub nominatim_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartupConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_catalog_refresh() -> u64 {
    24 * 60 * 60
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_max_feed_bytes() -> usize {
    DEFAULT_MAX_FEED_BYTES
}

fn default_max_attempts() -> u32 {
    8
}

fn default_initial_backoff() -> u64 {
    500
}

impl Config {
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text).wrap_err_with(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> eyre::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs must be positive");
        }
        if self.fetch_timeout_secs == 0 {
            bail!("fetch_timeout_secs must be positive");
        }
        if self.startup.max_attempts == 0 {
            bail!("startup.max_attempts must be at least 1");
        }
        self.catalog_source().map(drop)
    }

    pub fn catalog_source(&self) -> eyre::Result<CatalogSource> {
        match (&self.catalog.path, &self.catalog.url) {
            (Some(path), None) => Ok(CatalogSource::Path(path.clone())),
            (None, Some(url)) => Ok(CatalogSource::Url(url.clone())),
            (Some(_), Some(_)) => bail!("catalog.path and catalog.url are mutually exclusive"),
            (None, None) => bail!("one of catalog.path or catalog.url is required"),
        }
    }

    pub fn sources(&self) -> eyre::Result<FeedSources> {
        Ok(FeedSources {
            catalog: self.catalog_source()?,
            vehicle_positions: self.feeds.vehicle_positions.clone(),
            trip_updates: self.feeds.trip_updates.clone(),
        })
    }

    pub fn refresh_options(&self) -> RefreshOptions {
        RefreshOptions {
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_feed_bytes: self.max_feed_bytes,
            catalog_refresh: Duration::from_secs(self.catalog_refresh_secs),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl StartupConfig {
    /// Delay after the `attempt`th failure (1-based): doubles each time, capped at a minute.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor)).min(MAX_BACKOFF)
    }
}
