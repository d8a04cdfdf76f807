//! Fetch error types.

use thiserror::Error;

/// Reasons a fetch cycle can fail.
///
/// The `Display` output is the human-readable message shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Admission denied by the rate limiter.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// Unparsable URL or a scheme other than http/https.
    #[error("Invalid URL protocol")]
    InvalidUrl,

    /// Response status outside the success range.
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// Response content type missing or not JSON.
    #[error("Invalid response content type")]
    InvalidContentType,

    /// Body is not valid JSON or does not match the expected shape.
    #[error("{0}")]
    Parse(String),

    /// Body parsed to `null`.
    #[error("Invalid response data")]
    InvalidData,

    /// The request never produced a response.
    #[error("{0}")]
    Network(String),
}

/// Invalid caller-supplied header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The line has no `:` between name and value.
    #[error("Header '{0}' is not in 'Name: value' form")]
    MissingSeparator(String),

    /// The name is not a valid header token.
    #[error("Invalid header name '{0}'")]
    InvalidName(String),

    /// The value contains characters not allowed in a header.
    #[error("Invalid value for header '{0}'")]
    InvalidValue(String),
}

/// Discriminant of [`FetchError`], for kind-specific handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    RateLimited,
    InvalidUrl,
    Http,
    InvalidContentType,
    Parse,
    InvalidData,
    Network,
}

impl FetchError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::RateLimited => FetchErrorKind::RateLimited,
            Self::InvalidUrl => FetchErrorKind::InvalidUrl,
            Self::Http { .. } => FetchErrorKind::Http,
            Self::InvalidContentType => FetchErrorKind::InvalidContentType,
            Self::Parse(_) => FetchErrorKind::Parse,
            Self::InvalidData => FetchErrorKind::InvalidData,
            Self::Network(_) => FetchErrorKind::Network,
        }
    }
}

impl FetchErrorKind {
    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Http | Self::Network)
    }
}
