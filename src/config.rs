use std::env;
use std::time::Duration;
use url::Url;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub is_dev: bool,
    /// Base URL of the DAM API (listing and detail endpoints), no trailing slash
    pub dam_base_url: String,
    /// Bearer credential for listing and detail calls
    pub dam_token: String,
    /// Host serving the public stream endpoints, no trailing slash
    pub stream_base_url: String,
    /// Snapshot age after which a query refreshes synchronously
    pub cache_ttl: Duration,
    /// Period of the unconditional background refresh
    pub refresh_interval: Duration,
    /// Whether the background loop runs its first refresh immediately
    pub refresh_on_start: bool,
    /// Listing page size
    pub page_size: u32,
    /// Max in-flight detail fetches / stream probes
    pub fetch_concurrency: usize,
    /// Timeout applied to every remote call
    pub request_timeout: Duration,
    /// Attempts for listing and detail calls (1 = no retry)
    pub upstream_max_attempts: u32,
}

pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 480;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

impl Config {
    /// Load configuration from environment variables
    /// In DEV mode, provides sensible defaults. In PROD mode, the upstream settings are required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load(true)
    }

    /// Like [`Config::from_env`], but `PORT` is never required. For one-shot
    /// tools that do not listen.
    pub fn from_env_without_port() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load(false)
    }

    fn load(needs_port: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        // Port: required in prod, defaults to 3000 in dev
        let port = if !needs_port {
            parse_or("PORT", 0)
        } else if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let dam_base_url = if is_dev {
            env::var("DAM_BASE_URL").unwrap_or_else(|_| "https://dam.example.com".to_string())
        } else {
            env::var("DAM_BASE_URL").map_err(|_| "DAM_BASE_URL is required in production")?
        };
        let dam_base_url = normalize_base_url("DAM_BASE_URL", &dam_base_url)?;

        let dam_token = if is_dev {
            env::var("DAM_TOKEN").unwrap_or_default()
        } else {
            env::var("DAM_TOKEN").map_err(|_| "DAM_TOKEN is required in production")?
        };

        // Stream host defaults to the DAM host
        let stream_base_url = match env::var("STREAM_BASE_URL") {
            Ok(url) => normalize_base_url("STREAM_BASE_URL", &url)?,
            Err(_) => dam_base_url.clone(),
        };

        let cache_ttl = Duration::from_secs(parse_or("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS).max(1));
        let refresh_interval = Duration::from_secs(
            parse_or("REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL_SECS).max(1),
        );
        let refresh_on_start = parse_or("REFRESH_ON_START", true);
        let page_size = parse_or("PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1);
        let fetch_concurrency = parse_or("FETCH_CONCURRENCY", DEFAULT_FETCH_CONCURRENCY).max(1);
        let request_timeout = Duration::from_secs(
            parse_or("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS).max(1),
        );
        let upstream_max_attempts = parse_or("UPSTREAM_MAX_ATTEMPTS", 2u32).max(1);

        Ok(Config {
            port,
            is_dev,
            dam_base_url,
            dam_token,
            stream_base_url,
            cache_ttl,
            refresh_interval,
            refresh_on_start,
            page_size,
            fetch_concurrency,
            request_timeout,
            upstream_max_attempts,
        })
    }
}

/// Read `key` and parse it, falling back to `default` when missing or malformed.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Validate an http(s) base URL and strip any trailing slash.
fn normalize_base_url(key: &str, raw: &str) -> Result<String, String> {
    let parsed = Url::parse(raw).map_err(|e| format!("{key} is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(format!("{key} must be http or https, got '{scheme}'")),
    }
    Ok(raw.trim_end_matches('/').to_string())
}
