use std::path::PathBuf;

use bytesize::ByteSize;
use livecap_providers::LiveApiError;
use thiserror::Error;

/// Longest manifest excerpt kept in a [`ManifestError::Malformed`]
const MAX_EXCERPT_CHARS: usize = 512;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error; every variant ends the run with a non-zero exit.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output file {} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to resolve manifest URL: {0}")]
    Resolve(#[from] LiveApiError),

    #[error("Invalid manifest URL {url}: {source}")]
    InvalidManifestUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Capture(#[from] CaptureAborted),
}

impl Error {
    /// True for errors raised before any output was created.
    #[must_use]
    pub const fn is_setup(&self) -> bool {
        !matches!(self, Self::Capture(_))
    }
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Malformed manifest at {url}: missing #EXTM3U marker, content: {excerpt}")]
    Malformed { url: String, excerpt: String },

    #[error("Invalid segment reference {reference:?} in {url}: {source}")]
    InvalidReference {
        url: String,
        reference: String,
        #[source]
        source: url::ParseError,
    },
}

impl ManifestError {
    pub(crate) fn malformed(url: &url::Url, body: &str) -> Self {
        let excerpt = if body.chars().count() > MAX_EXCERPT_CHARS {
            let cut: String = body.chars().take(MAX_EXCERPT_CHARS).collect();
            format!("{cut}...")
        } else {
            body.to_string()
        };
        Self::Malformed {
            url: url.to_string(),
            excerpt,
        }
    }
}

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("Failed to fetch segment {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Segment {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read segment body {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failures that end a capture that has already started writing.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error("Failed to write output: {0}")]
    Sink(#[from] std::io::Error),
}

/// A capture that stopped on a fatal error. Data already written stays on disk.
#[derive(Error, Debug)]
#[error("Capture aborted after {segments_written} segment(s), {}: {source}", readable(.bytes_written))]
pub struct CaptureAborted {
    pub bytes_written: u64,
    pub segments_written: u64,
    #[source]
    pub source: CaptureError,
}

fn readable(bytes: &u64) -> ByteSize {
    ByteSize(*bytes)
}
