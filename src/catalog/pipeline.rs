//! One refresh pass: list → eligibility → stream URL → probe → snapshot.

use super::codec;
use super::model::{CachedVideo, RemoteAssetDetail, Snapshot};
use super::rules;
use super::source::AssetSource;
use crate::error::Result;
use chrono::Utc;
use futures_util::{StreamExt, future, stream};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct RefreshPipeline {
    source: Arc<dyn AssetSource>,
    stream_base_url: String,
    concurrency: usize,
}

impl RefreshPipeline {
    pub fn new(source: Arc<dyn AssetSource>, stream_base_url: String, concurrency: usize) -> Self {
        Self {
            source,
            stream_base_url,
            concurrency: concurrency.max(1),
        }
    }

    /// Build a fresh snapshot. SKU is not filtered here, the snapshot serves every SKU.
    pub async fn refresh(&self) -> Result<Snapshot> {
        let started = Instant::now();
        info!("🔄 Refreshing video catalog");

        let assets = self.source.list_all_video_assets().await?;
        let listed = assets.len();
        let today = Utc::now().date_naive();

        let candidates: Vec<(RemoteAssetDetail, String)> = assets
            .into_iter()
            .filter(|asset| rules::is_eligible(asset, today))
            .filter_map(|asset| match codec::stream_url(&self.stream_base_url, &asset.id) {
                Ok(url) => Some((asset, url)),
                Err(e) => {
                    warn!("Dropping asset: {}", e);
                    None
                }
            })
            .collect();
        let eligible = candidates.len();

        let source = &self.source;
        let videos: Vec<CachedVideo> = stream::iter(candidates)
            .map(|(asset, url)| async move {
                let live = source.probe_stream(&url).await;
                (asset, url, live)
            })
            .buffered(self.concurrency)
            .filter_map(|(asset, url, live)| {
                if !live {
                    debug!("Stream not public for asset {}", asset.id);
                }
                future::ready(live.then(|| CachedVideo::from_detail(asset, url)))
            })
            .collect()
            .await;

        info!(
            "✅ Catalog refreshed: {} streamable of {} eligible / {} listed ({}ms)",
            videos.len(),
            eligible,
            listed,
            started.elapsed().as_millis()
        );

        Ok(Snapshot::new(videos, Utc::now()))
    }
}
