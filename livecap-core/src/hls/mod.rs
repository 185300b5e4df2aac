//! HLS playlist handling
//!
//! Only the line-oriented subset needed for live capture: `#` lines are
//! skipped without interpretation and every other line is a segment (or a
//! nested playlist) reference.

pub mod fetcher;
pub mod key;
pub mod manifest;
pub mod segment;

pub use fetcher::{ManifestFetcher, ManifestSource};
pub use key::{segment_key, KeyOrder};
pub use manifest::{parse_manifest, SegmentRef};
pub use segment::{SegmentFetcher, SegmentSource};
