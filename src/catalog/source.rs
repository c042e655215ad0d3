//! Remote asset source: the only network boundary of the catalog.

use super::model::{RemoteAssetDetail, RemoteAssetSummary};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::http_retry::{RetryConfig, get_with_retry};
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hard ceiling on listing pages per refresh.
pub const MAX_PAGES: u32 = 1000;

/// Upstream DAM as seen by the refresh pipeline.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Every video asset with full details.
    ///
    /// A failed listing page ends pagination and returns what was gathered
    /// so far, which is empty when the first page fails.
    async fn list_all_video_assets(&self) -> Result<Vec<RemoteAssetDetail>>;

    /// `true` iff `url` answers a HEAD request with a 2xx. Never fails.
    async fn probe_stream(&self, url: &str) -> bool;
}

/// HTTP client for the DAM REST API.
#[derive(Clone, Debug)]
pub struct DamClient {
    http: Client,
    base_url: String,
    token: String,
    page_size: u32,
    concurrency: usize,
    retry: RetryConfig,
}

impl DamClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.dam_base_url.clone(),
            token: config.dam_token.clone(),
            page_size: config.page_size.max(1),
            concurrency: config.fetch_concurrency.max(1),
            retry: RetryConfig {
                max_attempts: config.upstream_max_attempts,
                timeout: Some(config.request_timeout),
                ..RetryConfig::default()
            },
        }
    }

    /// Override the pause between retries.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.retry.backoff = backoff;
        self
    }

    fn bearer(&self) -> Option<&str> {
        (!self.token.is_empty()).then_some(self.token.as_str())
    }

    /// One listing page (1-based).
    pub async fn list_page(&self, page: u32) -> Result<Vec<RemoteAssetSummary>> {
        let url = format!(
            "{}/api/v4/media/?type=video&page={}&limit={}",
            self.base_url, page, self.page_size
        );

        let response = get_with_retry(&self.http, &url, self.bearer(), &self.retry)
            .await
            .map_err(|e| AppError::UpstreamPage {
                page,
                reason: e.to_string(),
            })?;

        response
            .json::<Vec<RemoteAssetSummary>>()
            .await
            .map_err(|e| AppError::UpstreamPage {
                page,
                reason: format!("invalid listing body: {}", e),
            })
    }

    pub async fn fetch_detail(&self, id: &str) -> Result<RemoteAssetDetail> {
        let url = format!("{}/api/v4/media/{}/", self.base_url, id);

        let response = get_with_retry(&self.http, &url, self.bearer(), &self.retry)
            .await
            .map_err(|e| AppError::UpstreamDetail {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        response
            .json::<RemoteAssetDetail>()
            .await
            .map_err(|e| AppError::UpstreamDetail {
                id: id.to_string(),
                reason: format!("invalid detail body: {}", e),
            })
    }
}

#[async_trait]
impl AssetSource for DamClient {
    async fn list_all_video_assets(&self) -> Result<Vec<RemoteAssetDetail>> {
        let mut assets = Vec::new();
        let mut page = 1;

        loop {
            let summaries = match self.list_page(page).await {
                Ok(summaries) => summaries,
                Err(e) => {
                    warn!("{}; keeping {} assets from earlier pages", e, assets.len());
                    break;
                }
            };

            let received = summaries.len();
            debug!("Listing page {}: {} assets", page, received);
            if received == 0 {
                break;
            }

            // Details within a page are fetched concurrently, in listing order.
            let details: Vec<Result<RemoteAssetDetail>> = stream::iter(summaries)
                .map(|summary| async move { self.fetch_detail(&summary.id).await })
                .buffered(self.concurrency)
                .collect()
                .await;

            for detail in details {
                match detail {
                    Ok(detail) => assets.push(detail),
                    Err(e) => warn!("Skipping asset: {}", e),
                }
            }

            if received < self.page_size as usize {
                break;
            }
            if page >= MAX_PAGES {
                warn!("Stopping listing at page ceiling {}", MAX_PAGES);
                break;
            }
            page += 1;
        }

        info!("Fetched {} asset details from DAM", assets.len());
        Ok(assets)
    }

    async fn probe_stream(&self, url: &str) -> bool {
        match self
            .http
            .head(url)
            .timeout(self.retry.timeout.unwrap_or(Duration::from_secs(15)))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!("Stream probe {} returned {}", url, response.status());
                false
            }
            Err(e) => {
                debug!("Stream probe {} failed: {}", url, e);
                false
            }
        }
    }
}
