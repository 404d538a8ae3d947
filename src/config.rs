use std::env;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::error::AppError;

pub const DEFAULT_JOBS_API_BASE_URL: &str = "https://api.mytelth.com";
pub const DEFAULT_WEB3FORMS_ENDPOINT: &str = "https://api.web3forms.com/submit";
pub const DEFAULT_SITE: &str = "telthcare";
pub const DEFAULT_MAX_ITEMS: usize = 6;

/// Runtime settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub jobs_api_base_url: Url,
    pub web3forms_endpoint: Url,
    pub web3forms_access_key: Option<String>,
    pub default_site: String,
    pub default_max_items: usize,
    pub http_timeout: Duration,
    pub bind_addr: String,
    /// Lead submissions allowed per client IP per minute; `None` disables the limiter.
    pub rate_limit_per_minute: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jobs_api_base_url: Url::parse(DEFAULT_JOBS_API_BASE_URL)
                .expect("default jobs API URL is valid"),
            web3forms_endpoint: Url::parse(DEFAULT_WEB3FORMS_ENDPOINT)
                .expect("default web3forms URL is valid"),
            web3forms_access_key: None,
            default_site: DEFAULT_SITE.to_string(),
            default_max_items: DEFAULT_MAX_ITEMS,
            http_timeout: Duration::from_secs(30),
            bind_addr: "127.0.0.1:3000".to_string(),
            rate_limit_per_minute: Some(10),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env so values from the file are visible
        let _ = dotenvy::dotenv();

        let defaults = Config::default();

        let jobs_api_base_url = match env::var("JOBS_API_BASE_URL") {
            Ok(raw) => Url::parse(&raw).map_err(|e| {
                AppError::ConfigError(format!("JOBS_API_BASE_URL '{}' is not a URL: {}", raw, e))
            })?,
            Err(_) => defaults.jobs_api_base_url,
        };

        let web3forms_endpoint = match env::var("WEB3FORMS_ENDPOINT") {
            Ok(raw) => Url::parse(&raw).map_err(|e| {
                AppError::ConfigError(format!("WEB3FORMS_ENDPOINT '{}' is not a URL: {}", raw, e))
            })?,
            Err(_) => defaults.web3forms_endpoint,
        };

        let web3forms_access_key = env::var("WEB3FORMS_ACCESS_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if web3forms_access_key.is_none() {
            warn!("WEB3FORMS_ACCESS_KEY not set; lead submissions will be refused");
        }

        let default_site = env::var("DEFAULT_SITE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.default_site);

        let default_max_items = parse_var("DEFAULT_MAX_ITEMS")?.unwrap_or(defaults.default_max_items);

        let http_timeout = parse_var::<u64>("HTTP_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let bind_addr = env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let rate_limit_per_minute = match parse_var::<u32>("RATE_LIMIT_PER_MINUTE")? {
            Some(0) => None,
            Some(n) => Some(n),
            None => defaults.rate_limit_per_minute,
        };

        let config = Config {
            jobs_api_base_url,
            web3forms_endpoint,
            web3forms_access_key,
            default_site,
            default_max_items,
            http_timeout,
            bind_addr,
            rate_limit_per_minute,
        };
        info!(
            jobs_api = %config.jobs_api_base_url,
            site = %config.default_site,
            max_items = config.default_max_items,
            "configuration loaded"
        );
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, AppError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::ConfigError(format!("{} '{}': {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}
