//! `reqwest` backed feed fetching.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::models::FetchError;
use crate::network::traits::FeedFetcher;

/// Fetches feeds over HTTP(S), rejecting non-success responses.
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl FeedFetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self.client.get(url).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let bytes = response.bytes().await?;
            debug!(url, bytes = bytes.len(), "fetched feed");
            Ok(bytes.to_vec())
        })
    }
}
