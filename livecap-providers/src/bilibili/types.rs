//! Bilibili Live API Data Structures

use serde::Deserialize;

/// Common envelope of every live API response.
///
/// Failed calls carry the reason in `message` or `msg` depending on the
/// endpoint, so both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Best available failure reason.
    #[must_use]
    pub fn reason(&self) -> String {
        if !self.message.is_empty() {
            self.message.clone()
        } else if !self.msg.is_empty() {
            self.msg.clone()
        } else {
            "Unknown error".to_string()
        }
    }
}

/// `room_init` payload
#[derive(Debug, Clone, Deserialize)]
pub struct RoomInit {
    /// Internal stream id used by every other live endpoint
    pub room_id: u64,
    #[serde(default)]
    pub short_id: u64,
    #[serde(default)]
    pub uid: u64,
    /// 0: offline, 1: live, 2: rotating replays
    #[serde(default)]
    pub live_status: u8,
}

/// `playUrl` payload
#[derive(Debug, Clone, Deserialize)]
pub struct PlayUrlData {
    #[serde(default)]
    pub current_qn: u32,
    #[serde(default)]
    pub durl: Vec<PlayUrlCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayUrlCandidate {
    pub url: String,
    #[serde(default)]
    pub order: u32,
}
