//! Pluggable networking traits.
//!
//! The refresh cycle fetches through [`FeedFetcher`], so tests and embedders can
//! supply payloads from anywhere. Address resolution is a [`Geocoder`].

use std::future::Future;
use std::pin::Pin;

use geo::Point;

use crate::models::FetchError;

/// Fetch raw bytes from a URL
pub trait FeedFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>>;
}

/// Resolve free-form address text to a coordinate
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the address could not be resolved.
    fn geocode<'a>(
        &'a self,
        address: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Point>, FetchError>> + Send + 'a>>;
}
