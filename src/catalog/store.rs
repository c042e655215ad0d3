//! Holds the latest snapshot. Replaced wholesale, never mutated in place.

use super::model::Snapshot;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
pub struct CacheStore {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Swap in `snapshot`, returning the one it superseded.
    pub fn replace(&self, snapshot: Arc<Snapshot>) -> Option<Arc<Snapshot>> {
        debug!(
            "Installing snapshot with {} videos from {}",
            snapshot.len(),
            snapshot.created_at()
        );
        self.current
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .replace(snapshot)
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.is_stale_at(Utc::now(), ttl)
    }

    /// Stale when empty or when `now - created_at > ttl`.
    pub fn is_stale_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.current() {
            None => true,
            Some(snapshot) => {
                let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
                now.signed_duration_since(snapshot.created_at()) > ttl
            }
        }
    }
}
