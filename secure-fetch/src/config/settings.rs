//! Configuration file structure.

use crate::fetch::{header_pair, HeaderError, RequestOptions};
use crate::rate_limit::{RateLimiter, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MS};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::num::{NonZeroU32, NonZeroU64};
use std::path::PathBuf;

/// Top-level structure of the config file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AppConfig {
    /// `[rate-limit]` section.
    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    /// `[request]` section.
    #[serde(default)]
    pub request: RequestSettings,

    /// `[theme]` section.
    #[serde(default)]
    pub theme: ThemeSettings,
}

/// Admission policy shared by all fetchers of a run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RateLimitSettings {
    /// Requests admitted per window and identifier.
    #[serde(default = "default_max_requests")]
    pub max_requests: NonZeroU32,

    /// Window length in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: NonZeroU64,
}

impl RateLimitSettings {
    /// Builds a limiter using the system clock.
    pub fn build(&self) -> RateLimiter {
        RateLimiter::new(self.max_requests, self.window_ms)
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

fn default_max_requests() -> NonZeroU32 {
    DEFAULT_MAX_REQUESTS
}

fn default_window_ms() -> NonZeroU64 {
    DEFAULT_WINDOW_MS
}

/// Extra headers sent with every request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RequestSettings {
    /// Header name to value; these override the built-in defaults.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl RequestSettings {
    /// Converts the configured headers into request options.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError`] for the first invalid header.
    pub fn request_options(&self) -> Result<RequestOptions, HeaderError> {
        self.headers
            .iter()
            .try_fold(RequestOptions::new(), |options, (name, value)| {
                let (name, value) = header_pair(name, value)?;
                Ok(options.with_header(name, value))
            })
    }
}

/// Where the theme preference is persisted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ThemeSettings {
    /// JSON file backing the preference store; in-memory when absent.
    pub store_path: Option<PathBuf>,
}
