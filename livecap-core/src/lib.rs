//! livecap core
//!
//! Manifest polling, segment deduplication and the capture loop, plus the
//! configuration and logging shared by the binary.

pub mod capture;
pub mod config;
pub mod error;
pub mod hls;
pub mod logging;
pub mod recorder;

pub use capture::{Capture, CaptureEvent, CaptureOutcome, CaptureStatus, OutputSink};
pub use config::{load_config, Config};
pub use error::{CaptureAborted, CaptureError, Error, ManifestError, Result, SegmentError};
pub use hls::{KeyOrder, ManifestFetcher, ManifestSource, SegmentFetcher, SegmentRef, SegmentSource};
pub use recorder::{record, Recording};
