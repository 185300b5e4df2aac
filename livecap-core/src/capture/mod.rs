//! Capture loop
//!
//! Polls the manifest, writes every segment whose key sorts after the
//! high-water key, and stops when the stream ends or the cancellation token
//! fires. Cancellation is only honoured around manifest polls: a segment
//! fetch and its write always run to completion.

mod sink;
mod state;

use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

pub use sink::OutputSink;
pub use state::{CaptureEvent, CaptureOutcome, CaptureState, CaptureStatus};

use crate::error::{CaptureAborted, CaptureError};
use crate::hls::{KeyOrder, ManifestSource, SegmentSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureOptions {
    pub key_order: KeyOrder,
    /// Pause between manifest polls; zero polls back to back
    pub poll_interval: Duration,
}

pub struct Capture<M, S> {
    manifests: M,
    segments: S,
    options: CaptureOptions,
    events: Option<UnboundedSender<CaptureEvent>>,
}

impl<M, S> Capture<M, S>
where
    M: ManifestSource,
    S: SegmentSource,
{
    pub const fn new(manifests: M, segments: S, options: CaptureOptions) -> Self {
        Self {
            manifests,
            segments,
            options,
            events: None,
        }
    }

    /// Deliver progress events to `tx` in addition to logging them.
    #[must_use]
    pub fn with_events(mut self, tx: UnboundedSender<CaptureEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    fn emit(&self, event: CaptureEvent) {
        if let Some(tx) = &self.events {
            // a dropped receiver only means nobody is listening
            let _ = tx.send(event);
        }
    }

    /// Run until the stream ends or `cancel` fires.
    ///
    /// The sink is closed on every exit path. On a fatal error the bytes
    /// already appended stay where they are.
    pub async fn run<W>(
        &self,
        manifest_url: &Url,
        mut sink: OutputSink<W>,
        cancel: &CancellationToken,
    ) -> Result<CaptureOutcome, CaptureAborted>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut state = CaptureState::new(self.options.key_order);
        let mut status = CaptureStatus::Running;

        info!(url = %manifest_url, "Capture started");

        while status == CaptureStatus::Running {
            status = match self.poll_once(manifest_url, &mut sink, &mut state, cancel).await {
                Ok(next) => next,
                Err(source) => {
                    if let Err(e) = sink.close().await {
                        warn!(error = %e, "Failed to close output after abort");
                    }
                    error!(
                        bytes_written = state.bytes_written(),
                        error = %source,
                        "Capture aborted"
                    );
                    return Err(CaptureAborted {
                        bytes_written: state.bytes_written(),
                        segments_written: state.segments_written(),
                        source,
                    });
                }
            };
        }

        if let Err(e) = sink.close().await {
            return Err(CaptureAborted {
                bytes_written: state.bytes_written(),
                segments_written: state.segments_written(),
                source: CaptureError::Sink(e),
            });
        }

        info!(
            status = ?status,
            segments = state.segments_written(),
            bytes_written = state.bytes_written(),
            "Capture stopped"
        );
        self.emit(CaptureEvent::Stopped(status));
        Ok(state.finish(status))
    }

    /// One iteration: poll, write what is new, then wait for the next poll.
    async fn poll_once<W>(
        &self,
        manifest_url: &Url,
        sink: &mut OutputSink<W>,
        state: &mut CaptureState,
        cancel: &CancellationToken,
    ) -> Result<CaptureStatus, CaptureError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let listing = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(CaptureStatus::StoppedCancelled),
            listing = self.manifests.fetch_manifest(manifest_url) => listing?,
        };

        if listing.is_empty() {
            info!(url = %manifest_url, "Stream ended");
            return Ok(CaptureStatus::StoppedStreamEnded);
        }

        for segment in &listing {
            if !state.is_new(&segment.key) {
                continue;
            }

            let data = self.segments.fetch_segment(&segment.url).await?;
            sink.append(&data).await?;
            state.record(&segment.key, data.len());

            info!(
                key = %segment.key,
                size = %bytesize::ByteSize(state.bytes_written()),
                "Segment written"
            );
            self.emit(CaptureEvent::SegmentWritten {
                key: segment.key.clone(),
                bytes: data.len() as u64,
                total_bytes: state.bytes_written(),
            });
        }

        if cancel.is_cancelled() {
            return Ok(CaptureStatus::StoppedCancelled);
        }

        if !self.options.poll_interval.is_zero() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(CaptureStatus::StoppedCancelled),
                () = tokio::time::sleep(self.options.poll_interval) => {}
            }
        }

        debug!(high_water = ?state.high_water_key(), "Polling manifest again");
        Ok(CaptureStatus::Running)
    }
}
