//! Materialized view of the DAM's currently valid, publicly streamable videos.

pub mod codec;
pub mod model;
pub mod pipeline;
pub mod rules;
pub mod service;
pub mod source;
pub mod store;

pub use model::{CachedVideo, Snapshot, VideoView};
pub use pipeline::RefreshPipeline;
pub use service::{CatalogService, spawn_refresh_loop};
pub use source::{AssetSource, DamClient};
pub use store::CacheStore;
