//! One recording run: guard, resolve, open, capture.
//!
//! Setup steps run in an order that keeps failures cheap. The output path is
//! checked before any request goes out, and the file itself is only created
//! once a manifest URL is in hand.

use std::path::{Path, PathBuf};

use livecap_providers::StreamResolver;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use crate::capture::{Capture, CaptureEvent, CaptureOutcome, CaptureStatus, OutputSink};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::hls::{ManifestFetcher, SegmentFetcher};

/// Result of a run that stopped cleanly.
#[derive(Debug, Clone)]
pub struct Recording {
    pub output: PathBuf,
    /// False when cancellation arrived before the file was opened.
    pub created: bool,
    pub outcome: CaptureOutcome,
}

impl Recording {
    fn cancelled_before_start(output: &Path) -> Self {
        Self {
            output: output.to_path_buf(),
            created: false,
            outcome: CaptureOutcome {
                status: CaptureStatus::StoppedCancelled,
                bytes_written: 0,
                segments_written: 0,
                last_key: None,
            },
        }
    }
}

/// Record `room_id` into `output` until the stream ends or `cancel` fires.
pub async fn record<R>(
    config: &Config,
    resolver: &R,
    room_id: u64,
    output: &Path,
    cancel: &CancellationToken,
    events: Option<UnboundedSender<CaptureEvent>>,
) -> Result<Recording>
where
    R: StreamResolver + ?Sized,
{
    OutputSink::ensure_absent(output).await?;

    let resolved = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            info!(room_id = room_id, "Cancelled before capture started");
            return Ok(Recording::cancelled_before_start(output));
        }
        resolved = resolver.resolve(room_id) => resolved?,
    };

    let manifest_url = Url::parse(&resolved).map_err(|source| Error::InvalidManifestUrl {
        url: resolved.clone(),
        source,
    })?;

    let client = config.http.build_client()?;
    let manifests = ManifestFetcher::new(client.clone(), config.capture.max_manifest_depth);
    let segments = SegmentFetcher::new(client);

    let mut capture = Capture::new(manifests, segments, config.capture.options());
    if let Some(tx) = events {
        capture = capture.with_events(tx);
    }

    let sink = OutputSink::create(output).await?;
    info!(room_id = room_id, output = %output.display(), "Recording started");

    let outcome = capture.run(&manifest_url, sink, cancel).await?;
    Ok(Recording {
        output: output.to_path_buf(),
        created: true,
        outcome,
    })
}
