//! Configuration loading.
//!
//! Settings live in a TOML file:
//!
//! ```toml
//! [rate-limit]
//! max-requests = 20
//! window-ms = 60000
//!
//! [request]
//! headers = { "Accept-Language" = "en" }
//!
//! [theme]
//! store-path = "preferences.json"
//! ```
//!
//! A missing file yields the defaults.

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::{AppConfig, RateLimitSettings, RequestSettings, ThemeSettings};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SECURE_FETCH_CONFIG";

/// Config file looked up in the working directory as a last resort.
pub const DEFAULT_CONFIG_FILE: &str = "secure-fetch.toml";

/// Picks the config path: `explicit`, then [`CONFIG_ENV`], then
/// [`DEFAULT_CONFIG_FILE`].
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Loads and validates the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read, is not
/// valid TOML for [`AppConfig`], or contains invalid header entries.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    let config: AppConfig = toml::from_str(&contents).map_err(|source| ConfigError::TomlError {
        path: path.display().to_string(),
        source,
    })?;

    config
        .request
        .request_options()
        .map_err(|e| ConfigError::ValidationError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    info!(
        path = %path.display(),
        max_requests = config.rate_limit.max_requests.get(),
        window_ms = config.rate_limit.window_ms.get(),
        "Loaded config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_config(temp: &TempDir, contents: &str) -> PathBuf {
        let path = temp.path().join("secure-fetch.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config(&temp.path().join("missing.toml")).unwrap();

        assert_eq!(config.rate_limit.max_requests.get(), 20);
        assert_eq!(config.rate_limit.window_ms.get(), 60_000);
        assert!(config.request.headers.is_empty());
        assert!(config.theme.store_path.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
[rate-limit]
max-requests = 5
window-ms = 1000

[request]
headers = { "Accept-Language" = "en", "X-Client" = "cli" }

[theme]
store-path = "prefs.json"
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.rate_limit.max_requests.get(), 5);
        assert_eq!(config.request.headers.len(), 2);
        assert_eq!(
            config.theme.store_path.as_deref(),
            Some(Path::new("prefs.json"))
        );

        let limiter = config.rate_limit.build();
        assert_eq!(limiter.max_requests(), 5);
        assert_eq!(limiter.window(), Duration::from_secs(1));

        let options = config.request.request_options().unwrap();
        assert_eq!(options.headers().get("x-client").unwrap(), "cli");
    }

    #[test]
    fn command_line_headers_override_configured_ones() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            "[request]\nheaders = { \"Accept-Language\" = \"en\", \"X-Client\" = \"cli\" }\n",
        );
        let config = load_config(&path).unwrap();

        let (name, value) = crate::fetch::parse_header("Accept-Language: fr").unwrap();
        let mut overrides = crate::fetch::HeaderMap::new();
        overrides.append(name, value);

        let headers = config
            .request
            .request_options()
            .unwrap()
            .with_header_overrides(overrides)
            .merged_headers();
        let languages: Vec<_> = headers.get_all("accept-language").iter().collect();
        assert_eq!(languages, ["fr"]);
        assert_eq!(headers.get("x-client").unwrap(), "cli");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[rate-limit]\nmax-requests = 3\n");

        let config = load_config(&path).unwrap();
        assert_eq!(config.rate_limit.max_requests.get(), 3);
        assert_eq!(config.rate_limit.window_ms.get(), 60_000);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[rate-limit]\nmax-requests = 0\n");

        let error = load_config(&path).unwrap_err();
        assert!(matches!(error, ConfigError::TomlError { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[rate-limit]\nmax-request = 3\n");

        assert!(matches!(
            load_config(&path),
            Err(ConfigError::TomlError { .. })
        ));
    }

    #[test]
    fn invalid_headers_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[request]\nheaders = { \"bad name\" = \"x\" }\n");

        assert!(matches!(
            load_config(&path),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn explicit_path_wins_over_environment() {
        temp_env::with_var(CONFIG_ENV, Some("/from/env.toml"), || {
            assert_eq!(
                resolve_config_path(Some(Path::new("/explicit.toml"))),
                PathBuf::from("/explicit.toml")
            );
        });
    }

    #[test]
    fn environment_path_is_used_when_set() {
        temp_env::with_var(CONFIG_ENV, Some("/from/env.toml"), || {
            assert_eq!(resolve_config_path(None), PathBuf::from("/from/env.toml"));
        });
    }

    #[test]
    fn falls_back_to_default_file() {
        temp_env::with_var_unset(CONFIG_ENV, || {
            assert_eq!(resolve_config_path(None), PathBuf::from(DEFAULT_CONFIG_FILE));
        });
    }
}
