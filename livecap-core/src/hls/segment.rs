//! Segment download

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::trace;
use url::Url;

use crate::error::SegmentError;

/// Source of segment payloads for the capture loop.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    async fn fetch_segment(&self, url: &Url) -> Result<Bytes, SegmentError>;
}

#[async_trait]
impl<T: SegmentSource + ?Sized> SegmentSource for &T {
    async fn fetch_segment(&self, url: &Url) -> Result<Bytes, SegmentError> {
        (**self).fetch_segment(url).await
    }
}

/// HTTP segment fetcher. Failures are returned as-is, never retried.
#[derive(Clone)]
pub struct SegmentFetcher {
    client: Client,
}

impl SegmentFetcher {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SegmentSource for SegmentFetcher {
    async fn fetch_segment(&self, url: &Url) -> Result<Bytes, SegmentError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| SegmentError::Transport {
                url: url.to_string(),
                source,
            })?;

        // An error page appended to the output would corrupt it.
        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(SegmentError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let data = resp.bytes().await.map_err(|source| SegmentError::Body {
            url: url.to_string(),
            source,
        })?;

        trace!(url = %url, bytes = data.len(), "Segment fetched");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(http: &HttpConfig) -> SegmentFetcher {
        SegmentFetcher::new(http.build_client().unwrap())
    }

    #[tokio::test]
    async fn test_fetch_returns_raw_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live/seg-1.ts"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x47, 0x40, 0x00, 0x10]))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/live/seg-1.ts", server.uri())).unwrap();
        let data = fetcher(&HttpConfig::default()).fetch_segment(&url).await.unwrap();
        assert_eq!(&data[..], &[0x47, 0x40, 0x00, 0x10]);
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/live/seg-1.ts", server.uri())).unwrap();
        let err = fetcher(&HttpConfig::default()).fetch_segment(&url).await.unwrap_err();
        match err {
            SegmentError::Status { url: failed, status } => {
                assert_eq!(status, 404);
                assert!(failed.ends_with("/live/seg-1.ts"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1, 2, 3])
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let http = HttpConfig {
            timeout_ms: 50,
            ..HttpConfig::default()
        };
        let url = Url::parse(&format!("{}/live/seg-1.ts", server.uri())).unwrap();
        let err = fetcher(&http).fetch_segment(&url).await.unwrap_err();
        assert!(err.to_string().contains("seg-1.ts"));
        assert!(matches!(
            err,
            SegmentError::Transport { .. } | SegmentError::Body { .. }
        ));
    }
}
