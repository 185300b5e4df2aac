use bytesize::ByteSize;

use crate::hls::KeyOrder;

/// Capture loop states. A run starts in `Running` and ends in one of the
/// two stopped states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Running,
    StoppedStreamEnded,
    StoppedCancelled,
}

/// Dedup and progress bookkeeping owned by the capture loop.
#[derive(Debug, Clone)]
pub struct CaptureState {
    order: KeyOrder,
    high_water_key: Option<String>,
    bytes_written: u64,
    segments_written: u64,
}

impl CaptureState {
    #[must_use]
    pub const fn new(order: KeyOrder) -> Self {
        Self {
            order,
            high_water_key: None,
            bytes_written: 0,
            segments_written: 0,
        }
    }

    /// Whether a segment with `key` has not been written yet.
    #[must_use]
    pub fn is_new(&self, key: &str) -> bool {
        self.high_water_key
            .as_deref()
            .map_or(true, |high_water| self.order.is_after(key, high_water))
    }

    /// Record a completed write and advance the high-water key.
    pub fn record(&mut self, key: &str, len: usize) {
        self.high_water_key = Some(key.to_string());
        self.bytes_written += len as u64;
        self.segments_written += 1;
    }

    #[must_use]
    pub fn high_water_key(&self) -> Option<&str> {
        self.high_water_key.as_deref()
    }

    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    #[must_use]
    pub const fn segments_written(&self) -> u64 {
        self.segments_written
    }

    pub(crate) fn finish(self, status: CaptureStatus) -> CaptureOutcome {
        CaptureOutcome {
            status,
            bytes_written: self.bytes_written,
            segments_written: self.segments_written,
            last_key: self.high_water_key,
        }
    }
}

/// Summary of a capture that stopped cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub status: CaptureStatus,
    pub bytes_written: u64,
    pub segments_written: u64,
    pub last_key: Option<String>,
}

impl CaptureOutcome {
    /// Size as B / KiB / MiB / GiB
    #[must_use]
    pub fn readable_size(&self) -> String {
        ByteSize(self.bytes_written).to_string()
    }
}

/// Progress notifications emitted while capturing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    SegmentWritten {
        key: String,
        bytes: u64,
        total_bytes: u64,
    },
    Stopped(CaptureStatus),
}
