use super::rules;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One row of a listing page. Only the id is needed to fetch the detail.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteAssetSummary {
    pub id: String,
}

/// Full asset record from the detail endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteAssetDetail {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "mediaName", default)]
    pub media_name: Option<String>,
    #[serde(rename = "dateCreated", default)]
    pub date_created: Option<String>,
    #[serde(rename = "dateModified", default)]
    pub date_modified: Option<String>,
    #[serde(default, deserialize_with = "thumbnail_map")]
    pub thumbnails: Map<String, Value>,
    #[serde(rename = "property_Usage_Rights", default, deserialize_with = "tag_list")]
    pub usage_rights: Vec<String>,
    #[serde(rename = "property_SKU", default, deserialize_with = "tag_list")]
    pub skus: Vec<String>,
    #[serde(rename = "property_Organic_expiry_date", default, deserialize_with = "expiry")]
    pub expiry_date: Option<String>,
}

impl RemoteAssetDetail {
    /// `mediaName`, then `name`, then the raw id.
    pub fn display_name(&self) -> &str {
        self.media_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or(&self.id)
    }
}

/// Tag properties are only honoured when they are arrays of strings.
fn tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn thumbnail_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

/// Accepts a string, a single-element array of strings, or null.
fn expiry<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Array(items) => items.into_iter().find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }),
        _ => None,
    })
}

/// A video that passed eligibility and the liveness probe.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedVideo {
    pub id: String,
    pub name: String,
    pub stream_url: String,
    pub thumbnails: Map<String, Value>,
    pub date_created: Option<String>,
    pub date_modified: Option<String>,
    pub skus: Vec<String>,
}

impl CachedVideo {
    pub fn from_detail(detail: RemoteAssetDetail, stream_url: String) -> Self {
        let name = detail.display_name().to_string();
        Self {
            id: detail.id,
            name,
            stream_url,
            thumbnails: detail.thumbnails,
            date_created: detail.date_created,
            date_modified: detail.date_modified,
            skus: detail.skus,
        }
    }

    pub fn has_sku(&self, sku: &str) -> bool {
        rules::matches_sku(&self.skus, sku)
    }
}

/// Response shape of a cached video (SKU tags stripped).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    pub id: String,
    pub name: String,
    pub stream_url: String,
    pub thumbnails: Map<String, Value>,
    pub date_created: Option<String>,
    pub date_modified: Option<String>,
}

impl From<&CachedVideo> for VideoView {
    fn from(video: &CachedVideo) -> Self {
        Self {
            id: video.id.clone(),
            name: video.name.clone(),
            stream_url: video.stream_url.clone(),
            thumbnails: video.thumbnails.clone(),
            date_created: video.date_created.clone(),
            date_modified: video.date_modified.clone(),
        }
    }
}

/// Immutable result of one refresh.
#[derive(Debug, Clone)]
pub struct Snapshot {
    videos: Vec<CachedVideo>,
    created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(videos: Vec<CachedVideo>, created_at: DateTime<Utc>) -> Self {
        Self { videos, created_at }
    }

    pub fn videos(&self) -> &[CachedVideo] {
        &self.videos
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Videos tagged with exactly `sku`, in snapshot order.
    pub fn videos_for_sku(&self, sku: &str) -> Vec<VideoView> {
        self.videos
            .iter()
            .filter(|v| v.has_sku(sku))
            .map(VideoView::from)
            .collect()
    }
}
