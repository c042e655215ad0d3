//! Asset id → canonical UUID → stream URL.
//!
//! The DAM lists assets under a compact id, but stream endpoints are addressed
//! by the hyphenated lower-case UUID form.

use crate::error::{AppError, Result};
use std::fmt;
use uuid::Uuid;

/// Canonical 8-4-4-4-12 lower-case identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalId(Uuid);

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, '-' | '_' | '{' | '}') || c.is_whitespace()
}

/// Strip separators and require exactly 32 hex digits.
pub fn canonicalize(raw_id: &str) -> Result<CanonicalId> {
    let hex: String = raw_id.chars().filter(|c| !is_separator(*c)).collect();

    if hex.len() != 32 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::InvalidIdentifier(raw_id.to_string()));
    }

    Uuid::try_parse(&hex)
        .map(CanonicalId)
        .map_err(|_| AppError::InvalidIdentifier(raw_id.to_string()))
}

/// Public HLS endpoint for an asset on `stream_base_url`.
pub fn stream_url(stream_base_url: &str, raw_id: &str) -> Result<String> {
    let id = canonicalize(raw_id)?;
    Ok(format!("{}/vod-stream/{}/play-hls2.m3u8", stream_base_url, id))
}
