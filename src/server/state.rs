use crate::{
    catalog::{AssetSource, CatalogService, DamClient, RefreshPipeline},
    config::Config,
    error::Result,
    metrics,
};
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Cached catalog of streamable videos
    pub catalog: CatalogService,
    /// Prometheus render handle for `/metrics`
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Create state backed by the DAM configured in `config`
    pub fn new(config: Config) -> Result<Self> {
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .timeout(config.request_timeout)
            .build()?;

        let source = Arc::new(DamClient::new(http_client, &config));
        Ok(Self::with_source(config, source))
    }

    /// Create state around any asset source
    pub fn with_source(config: Config, source: Arc<dyn AssetSource>) -> Self {
        let pipeline = RefreshPipeline::new(
            source,
            config.stream_base_url.clone(),
            config.fetch_concurrency,
        );
        let catalog = CatalogService::new(pipeline, config.cache_ttl);

        Self {
            config: Arc::new(config),
            catalog,
            metrics: metrics::init(),
        }
    }
}
