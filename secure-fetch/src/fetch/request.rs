//! Caller-supplied request configuration.

use super::error::HeaderError;
use super::transport::HttpRequest;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

/// Method, headers and body applied to every request a fetcher issues.
///
/// Everything is passed through unchanged except headers, which are merged
/// over the defaults `Content-Type: application/json` and
/// `X-Requested-With: XMLHttpRequest`.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    method: Method,
    headers: HeaderMap,
    body: Option<String>,
}

impl RequestOptions {
    /// Creates options for a plain `GET` with no extra headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a header. Repeating a name sends every value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Layers `overrides` on top of the headers set so far.
    ///
    /// Every name in `overrides` drops the values previously set for it;
    /// repeats within `overrides` are all kept.
    pub fn with_header_overrides(mut self, overrides: HeaderMap) -> Self {
        for name in overrides.keys() {
            self.headers.remove(name);
        }
        self.with_headers(overrides)
    }

    /// Adds every header of `headers`.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in &headers {
            self.headers.append(name.clone(), value.clone());
        }
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the caller-supplied headers (without defaults).
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request body.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the headers actually sent: defaults overridden by caller headers.
    pub fn merged_headers(&self) -> HeaderMap {
        let mut merged = HeaderMap::new();
        merged.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        merged.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );

        for name in self.headers.keys() {
            merged.remove(name);
        }
        for (name, value) in &self.headers {
            merged.append(name.clone(), value.clone());
        }
        merged
    }

    /// Builds the request for `url`.
    pub(crate) fn to_request(&self, url: Url) -> HttpRequest {
        HttpRequest {
            method: self.method.clone(),
            url,
            headers: self.merged_headers(),
            body: self.body.clone(),
        }
    }
}

/// Parses a `Name: value` header line.
///
/// # Errors
///
/// Returns [`HeaderError`] if the separator is missing or the name or value
/// is not a valid HTTP header token.
pub fn parse_header(line: &str) -> Result<(HeaderName, HeaderValue), HeaderError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| HeaderError::MissingSeparator(line.to_owned()))?;
    header_pair(name.trim(), value.trim())
}

/// Validates a header name/value pair.
///
/// # Errors
///
/// Returns [`HeaderError`] if either part is not a valid header token.
pub fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HeaderError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| HeaderError::InvalidName(name.to_owned()))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|_| HeaderError::InvalidValue(name.to_owned()))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{ACCEPT, AUTHORIZATION};

    #[test]
    fn defaults_are_sent_without_caller_headers() {
        let headers = RequestOptions::new().merged_headers();

        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get("x-requested-with").unwrap(), "XMLHttpRequest");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn caller_headers_override_only_what_they_name() {
        let options = RequestOptions::new()
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));

        let headers = options.merged_headers();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(headers.get("x-requested-with").unwrap(), "XMLHttpRequest");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn repeated_caller_headers_are_all_kept() {
        let options = RequestOptions::new()
            .with_header(ACCEPT, HeaderValue::from_static("application/json"))
            .with_header(ACCEPT, HeaderValue::from_static("text/json"));

        assert_eq!(options.merged_headers().get_all(ACCEPT).iter().count(), 2);
    }

    #[test]
    fn overrides_replace_earlier_headers_of_the_same_name() {
        let (name, value) = parse_header("Accept-Language: fr").unwrap();
        let mut overrides = HeaderMap::new();
        overrides.append(name, value);

        let options = RequestOptions::new()
            .with_header(
                HeaderName::from_static("accept-language"),
                HeaderValue::from_static("en"),
            )
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer abc"))
            .with_header_overrides(overrides);

        let headers = options.merged_headers();
        let languages: Vec<_> = headers.get_all("accept-language").iter().collect();
        assert_eq!(languages, ["fr"]);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn overrides_keep_their_own_repeats() {
        let mut overrides = HeaderMap::new();
        overrides.append(ACCEPT, HeaderValue::from_static("application/json"));
        overrides.append(ACCEPT, HeaderValue::from_static("text/json"));

        let options = RequestOptions::new()
            .with_header(ACCEPT, HeaderValue::from_static("*/*"))
            .with_header_overrides(overrides);

        let accepted: Vec<_> = options.headers().get_all(ACCEPT).iter().collect();
        assert_eq!(accepted, ["application/json", "text/json"]);
    }

    #[test]
    fn method_and_body_pass_through() {
        let options = RequestOptions::new()
            .with_method(Method::POST)
            .with_body(r#"{"q":1}"#);
        let request = options.to_request(Url::parse("https://api.example.com/items").unwrap());

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body.as_deref(), Some(r#"{"q":1}"#));
        assert_eq!(request.url.as_str(), "https://api.example.com/items");
    }

    #[test]
    fn parse_header_accepts_name_value_lines() {
        let (name, value) = parse_header("X-Api-Key:  secret ").unwrap();
        assert_eq!(name.as_str(), "x-api-key");
        assert_eq!(value, "secret");
    }

    #[test]
    fn parse_header_rejects_malformed_lines() {
        assert!(matches!(
            parse_header("no separator"),
            Err(HeaderError::MissingSeparator(_))
        ));
        assert!(matches!(
            parse_header("bad name: value"),
            Err(HeaderError::InvalidName(_))
        ));
        assert!(matches!(
            parse_header("X-Ok: line\nbreak"),
            Err(HeaderError::InvalidValue(_))
        ));
    }
}
