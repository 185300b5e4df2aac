//! Bilibili Live Client
//!
//! Pure HTTP client for the Bilibili live-room API.
//!
//! # Features
//! - Room lookup (public room number to internal stream id)
//! - Play URL lookup (internal stream id to HLS manifest URL)
//! - [`StreamResolver`] implementation chaining both calls

pub mod client;
pub mod error;
pub mod service;
pub mod types;

pub use client::{BilibiliLiveClient, LiveClientOptions};
pub use error::LiveApiError;
pub use service::StreamResolver;
pub use types::*;
