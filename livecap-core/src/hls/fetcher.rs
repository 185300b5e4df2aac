//! Manifest fetching
//!
//! An unreachable or failing playlist means the stream is over, so those
//! cases come back as an empty listing rather than an error. Only a body that
//! is not a playlist at all is fatal.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use super::manifest::{is_nested_manifest, parse_manifest, SegmentRef};
use crate::error::ManifestError;

/// Source of manifest listings for the capture loop.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Current listing of `url`; empty once the stream has ended.
    async fn fetch_manifest(&self, url: &Url) -> Result<Vec<SegmentRef>, ManifestError>;
}

#[async_trait]
impl<T: ManifestSource + ?Sized> ManifestSource for &T {
    async fn fetch_manifest(&self, url: &Url) -> Result<Vec<SegmentRef>, ManifestError> {
        (**self).fetch_manifest(url).await
    }
}

/// HTTP manifest fetcher following nested playlists up to `max_depth` levels
#[derive(Clone)]
pub struct ManifestFetcher {
    client: Client,
    max_depth: u8,
}

impl ManifestFetcher {
    #[must_use]
    pub const fn new(client: Client, max_depth: u8) -> Self {
        Self { client, max_depth }
    }

    /// GET a playlist. `None` when the stream should be treated as ended.
    ///
    /// Returns the final URL after HTTP redirects alongside the body so
    /// relative references resolve against the right directory.
    async fn fetch_body(&self, url: &Url) -> Option<(Url, String)> {
        let resp = match self.client.get(url.clone()).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to fetch manifest");
                return None;
            }
        };

        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            info!(url = %url, status = status.as_u16(), "Manifest no longer available");
            return None;
        }

        let final_url = resp.url().clone();
        match resp.text().await {
            Ok(body) => Some((final_url, body)),
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to read manifest body");
                None
            }
        }
    }
}

#[async_trait]
impl ManifestSource for ManifestFetcher {
    async fn fetch_manifest(&self, url: &Url) -> Result<Vec<SegmentRef>, ManifestError> {
        let mut current = url.clone();
        let mut depth = 0;

        loop {
            let Some((base, body)) = self.fetch_body(&current).await else {
                return Ok(Vec::new());
            };

            let segments = parse_manifest(&base, &body)?;
            if depth < self.max_depth && is_nested_manifest(&current, &segments) {
                depth += 1;
                current = segments[0].url.clone();
                debug!(nested = %current, depth = depth, "Following nested manifest");
                continue;
            }

            debug!(url = %current, segments = segments.len(), "Manifest fetched");
            return Ok(segments);
        }
    }
}
