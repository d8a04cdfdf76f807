#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod config;
pub mod contact;
pub mod fetch;
pub mod logging;
pub mod rate_limit;
pub mod security;
pub mod summary;
pub mod theme;

pub use config::{load_config, resolve_config_path, AppConfig, ConfigError};
pub use contact::{ContactField, ContactForm, FieldErrors};
pub use fetch::{
    FetchError, FetchErrorKind, FetchState, HeaderError, RequestOptions, ReqwestTransport,
    SecureFetcher, Transport, TransportError,
};
pub use logging::{LogBuffer, LogEntry};
pub use rate_limit::{Clock, MockClock, RateLimiter, SystemClock};
pub use summary::FetchSummary;
pub use theme::{
    FileStore, MemoryStore, PreferenceStore, StoreError, Theme, ThemeConfig, ThemeManager,
};
