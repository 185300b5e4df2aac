//! Manifest resolution seam
//!
//! Capture code only needs "room number in, manifest URL out"; this trait
//! keeps it independent of the concrete upstream client.

use async_trait::async_trait;
use tracing::info;

use super::{client::BilibiliLiveClient, LiveApiError};

/// Resolves a public room number to a playable manifest URL.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    async fn resolve(&self, room_id: u64) -> Result<String, LiveApiError>;
}

#[async_trait]
impl StreamResolver for BilibiliLiveClient {
    /// Two chained lookups, both fail-fast: room number to internal stream
    /// id, then stream id to the first play candidate.
    async fn resolve(&self, room_id: u64) -> Result<String, LiveApiError> {
        let room = self.room_init(room_id).await?;
        let manifest_url = self.play_url(room.room_id).await?;

        info!(
            room_id = room_id,
            stream_id = room.room_id,
            "Resolved manifest URL"
        );
        Ok(manifest_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bilibili::LiveClientOptions;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_resolve_chains_room_and_play_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/room/v1/Room/room_init"))
            .and(query_param("id", "6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "data": { "room_id": 7_734_200 }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/xlive/web-room/v1/playUrl/playUrl"))
            .and(query_param("cid", "7734200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "data": { "durl": [ { "url": "https://cdn.example.com/a/index.m3u8" } ] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BilibiliLiveClient::new(LiveClientOptions {
            base_url: server.uri(),
            ..LiveClientOptions::default()
        })
        .unwrap();

        let url = client.resolve(6).await.unwrap();
        assert_eq!(url, "https://cdn.example.com/a/index.m3u8");
    }

    #[tokio::test]
    async fn test_resolve_stops_after_failed_room_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/room/v1/Room/room_init"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": -400,
                "message": "invalid room"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/xlive/web-room/v1/playUrl/playUrl"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = BilibiliLiveClient::new(LiveClientOptions {
            base_url: server.uri(),
            ..LiveClientOptions::default()
        })
        .unwrap();

        let err = client.resolve(6).await.unwrap_err();
        assert!(matches!(err, LiveApiError::Api { code: -400, .. }));
    }
}
