//! Playlist body parsing

use url::Url;

use super::key::segment_key;
use crate::error::ManifestError;

pub const MANIFEST_MARKER: &str = "#EXTM3U";
const COMMENT_MARKER: char = '#';

/// A segment (or nested playlist) listed by a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRef {
    pub url: Url,
    pub key: String,
}

/// Parse a playlist body into its references, in listed order.
///
/// Relative references resolve against `base`; absolute ones are kept.
/// The key is derived from the reference as written in the body.
pub fn parse_manifest(base: &Url, body: &str) -> Result<Vec<SegmentRef>, ManifestError> {
    if !body.contains(MANIFEST_MARKER) {
        return Err(ManifestError::malformed(base, body));
    }

    let mut segments = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }

        let url = base.join(line).map_err(|source| ManifestError::InvalidReference {
            url: base.to_string(),
            reference: line.to_string(),
            source,
        })?;

        segments.push(SegmentRef {
            url,
            key: segment_key(line),
        });
    }

    Ok(segments)
}

/// Lowercased extension of the last path component, if any.
#[must_use]
pub fn url_extension(url: &Url) -> Option<String> {
    let name = url.path_segments()?.next_back()?;
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// A listing whose only entry has the manifest's own extension points to
/// another manifest (typically a per-quality variant).
#[must_use]
pub fn is_nested_manifest(manifest_url: &Url, segments: &[SegmentRef]) -> bool {
    match (segments, url_extension(manifest_url)) {
        ([only], Some(ext)) => url_extension(&only.url).as_deref() == Some(ext.as_str()),
        _ => false,
    }
}
