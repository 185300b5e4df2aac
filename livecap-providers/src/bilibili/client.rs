//! Bilibili Live HTTP Client

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::LiveApiError;
use super::types::{ApiResponse, PlayUrlData, RoomInit};

pub const DEFAULT_BASE_URL: &str = "https://api.live.bilibili.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const REFERER: &str = "https://live.bilibili.com";

const ROOM_INIT_PATH: &str = "/room/v1/Room/room_init";
const PLAY_URL_PATH: &str = "/xlive/web-room/v1/playUrl/playUrl";

/// Connection and query parameters for [`BilibiliLiveClient`].
#[derive(Debug, Clone)]
pub struct LiveClientOptions {
    pub base_url: String,
    /// `qn` query parameter (10000 = original quality)
    pub quality: u32,
    pub platform: String,
    pub ptype: u32,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub referer: String,
}

impl Default for LiveClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            quality: 10000,
            platform: "h5".to_string(),
            ptype: 16,
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(3),
            user_agent: USER_AGENT.to_string(),
            referer: REFERER.to_string(),
        }
    }
}

/// Bilibili Live HTTP Client
pub struct BilibiliLiveClient {
    client: Client,
    base_url: String,
    referer: String,
    quality: u32,
    platform: String,
    ptype: u32,
}

impl BilibiliLiveClient {
    /// Create a new client from explicit options
    pub fn new(options: LiveClientOptions) -> Result<Self, LiveApiError> {
        url::Url::parse(&options.base_url).map_err(|e| {
            LiveApiError::InvalidConfig(format!("base_url {:?}: {e}", options.base_url))
        })?;

        let client = Client::builder()
            .user_agent(options.user_agent)
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| LiveApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            referer: options.referer,
            quality: options.quality,
            platform: options.platform,
            ptype: options.ptype,
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base_url))
            .header("Referer", &self.referer)
    }

    /// Look up a room by its public number.
    ///
    /// The returned `room_id` is the internal stream id; short vanity numbers
    /// map to a different long id here.
    pub async fn room_init(&self, room_id: u64) -> Result<RoomInit, LiveApiError> {
        let req = self.get(ROOM_INIT_PATH).query(&[("id", room_id)]);
        let room: RoomInit = self.fetch_data(req).await?;

        debug!(
            room_id = room_id,
            stream_id = room.room_id,
            live_status = room.live_status,
            "Room lookup complete"
        );
        Ok(room)
    }

    /// Get the manifest URL of the first play candidate for a stream id
    pub async fn play_url(&self, stream_id: u64) -> Result<String, LiveApiError> {
        let req = self.get(PLAY_URL_PATH).query(&[
            ("cid", stream_id.to_string()),
            ("qn", self.quality.to_string()),
            ("platform", self.platform.clone()),
            ("ptype", self.ptype.to_string()),
        ]);
        let data: PlayUrlData = self.fetch_data(req).await?;

        let candidate = data
            .durl
            .into_iter()
            .next()
            .ok_or(LiveApiError::NoCandidate(stream_id))?;

        debug!(
            stream_id = stream_id,
            quality = data.current_qn,
            url = %candidate.url,
            "Play URL resolved"
        );
        Ok(candidate.url)
    }

    /// Send a request and unwrap the `{code, message, data}` envelope.
    ///
    /// The body is read as text first so that shape errors can report the
    /// raw content.
    async fn fetch_data<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, LiveApiError> {
        let resp = req.send().await?;
        let url = resp.url().to_string();
        let status = resp.status();
        if !status.is_success() {
            return Err(LiveApiError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        let envelope: ApiResponse = serde_json::from_str(&body).map_err(|e| LiveApiError::Parse {
            context: format!("invalid JSON from {url}: {e}"),
            body: body.clone(),
        })?;

        if envelope.code != 0 {
            return Err(LiveApiError::Api {
                code: envelope.code,
                message: envelope.reason(),
            });
        }

        let data = envelope.data.ok_or_else(|| LiveApiError::Parse {
            context: format!("missing data in response from {url}"),
            body: body.clone(),
        })?;

        serde_json::from_value(data).map_err(|e| LiveApiError::Parse {
            context: format!("unexpected data from {url}: {e}"),
            body,
        })
    }
}
