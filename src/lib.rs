pub mod catalog;
pub mod config;
pub mod error;
pub mod http_retry;
pub mod metrics;
pub mod server;
