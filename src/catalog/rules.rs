//! Eligibility predicates over a fetched asset.
//!
//! Dates are compared as UTC calendar days: an asset expiring "today" is
//! still valid for the whole of today (UTC).

use super::model::RemoteAssetDetail;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

/// Usage-rights tag that allows publishing on the website.
pub const WEBSITE_USAGE_RIGHT: &str = "Website";

/// Parse an expiry value into a UTC calendar date.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD`, and `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|ts| ts.date())
}

/// No expiry, or expiry on or after `today`. Unparseable expiry counts as expired.
pub fn not_expired(asset: &RemoteAssetDetail, today: NaiveDate) -> bool {
    let Some(raw) = asset.expiry_date.as_deref() else {
        return true;
    };
    match parse_expiry(raw) {
        Some(expiry) => expiry >= today,
        None => {
            debug!("Asset {} has unparseable expiry {:?}", asset.id, raw);
            false
        }
    }
}

pub fn has_website_usage_rights(asset: &RemoteAssetDetail) -> bool {
    asset.usage_rights.iter().any(|r| r == WEBSITE_USAGE_RIGHT)
}

/// Exact, case-sensitive SKU match against a tag set.
pub fn matches_sku(skus: &[String], target: &str) -> bool {
    skus.iter().any(|s| s == target)
}

/// SKU-agnostic eligibility used when building a snapshot.
pub fn is_eligible(asset: &RemoteAssetDetail, today: NaiveDate) -> bool {
    not_expired(asset, today) && has_website_usage_rights(asset)
}
