//! Query entry point and background refresher around a single [`CacheStore`].
//!
//! At most one pipeline run is in flight at a time. A trigger that arrives
//! while a run is active awaits that run's result instead of starting another.

use super::model::{Snapshot, VideoView};
use super::pipeline::RefreshPipeline;
use super::store::CacheStore;
use crate::error::{AppError, Result};
use crate::metrics;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type RefreshOutcome = std::result::Result<Arc<Snapshot>, String>;
type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<Inner>,
}

struct Inner {
    store: CacheStore,
    pipeline: RefreshPipeline,
    ttl: Duration,
    in_flight: Mutex<Option<InFlight>>,
    runs: AtomicU64,
}

impl CatalogService {
    pub fn new(pipeline: RefreshPipeline, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: CacheStore::new(),
                pipeline,
                ttl,
                in_flight: Mutex::new(None),
                runs: AtomicU64::new(0),
            }),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.inner.store
    }

    /// Number of pipeline executions started so far.
    pub fn refresh_runs(&self) -> u64 {
        self.inner.runs.load(Ordering::SeqCst)
    }

    /// Videos tagged with `sku`, refreshing first if the cache is stale.
    pub async fn videos_for_sku(&self, sku: &str) -> Result<Vec<VideoView>> {
        let snapshot = self.snapshot_for_query().await?;
        let videos = snapshot.videos_for_sku(sku);
        info!("🎯 {} video(s) match SKU \"{}\"", videos.len(), sku);
        Ok(videos)
    }

    async fn snapshot_for_query(&self) -> Result<Arc<Snapshot>> {
        let store = &self.inner.store;
        if !store.is_stale(self.inner.ttl)
            && let Some(snapshot) = store.current()
        {
            return Ok(snapshot);
        }

        match self.refresh("query").await {
            Ok(snapshot) => Ok(snapshot),
            Err(reason) => match store.current() {
                Some(previous) => {
                    warn!(
                        "Refresh failed, serving snapshot from {}: {}",
                        previous.created_at(),
                        reason
                    );
                    Ok(previous)
                }
                None => Err(AppError::Refresh(reason)),
            },
        }
    }

    /// Run the pipeline, or join the run already in flight.
    ///
    /// On success the new snapshot is installed before this returns. On
    /// failure the store is left untouched.
    pub async fn refresh(&self, trigger: &'static str) -> RefreshOutcome {
        let in_flight = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(|p| p.into_inner());

            match slot.as_ref() {
                Some(running) => {
                    debug!("Joining in-flight refresh ({} trigger)", trigger);
                    running.clone()
                }
                None => {
                    // Spawned so a cancelled caller cannot abort a half-done run
                    let service = self.clone();
                    let task = tokio::spawn(async move {
                        let _clear = ClearInFlight(service.clone());
                        service.run_pipeline(trigger).await
                    });
                    let shared = async move {
                        task.await
                            .unwrap_or_else(|e| Err(format!("refresh task aborted: {}", e)))
                    }
                    .boxed()
                    .shared();
                    *slot = Some(shared.clone());
                    shared
                }
            }
        };

        in_flight.await
    }

    async fn run_pipeline(&self, trigger: &'static str) -> RefreshOutcome {
        let started = Instant::now();
        self.inner.runs.fetch_add(1, Ordering::SeqCst);

        match self.inner.pipeline.refresh().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.inner.store.replace(snapshot.clone());
                metrics::set_snapshot_size(snapshot.len());
                metrics::record_refresh(trigger, "ok", started);
                Ok(snapshot)
            }
            Err(e) => {
                metrics::record_refresh(trigger, "error", started);
                error!("❌ Catalog refresh ({} trigger) failed: {}", trigger, e);
                Err(e.to_string())
            }
        }
    }
}

/// Empties the in-flight slot when the refresh task ends, including by panic.
struct ClearInFlight(CatalogService);

impl Drop for ClearInFlight {
    fn drop(&mut self) {
        self.0
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
    }
}

/// Refresh unconditionally every `period` until `cancel` fires.
///
/// Failures are logged; the previous snapshot stays in place and the loop
/// keeps going.
pub fn spawn_refresh_loop(
    service: CatalogService,
    period: Duration,
    refresh_on_start: bool,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("🕐 Background catalog refresh every {}s", period.as_secs());

        let first = if refresh_on_start {
            tokio::time::Instant::now()
        } else {
            tokio::time::Instant::now() + period
        };
        let mut ticker = tokio::time::interval_at(first, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = service.refresh("background").await {
                        warn!("Background refresh failed, keeping previous snapshot: {}", e);
                    }
                }
            }
        }

        info!("Background catalog refresh stopped");
    })
}
