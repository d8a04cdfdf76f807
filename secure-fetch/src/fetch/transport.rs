//! Network boundary of the fetcher.

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use std::future::Future;
use thiserror::Error;
use url::Url;

/// A fully prepared outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Validated http(s) target.
    pub url: Url,
    /// Headers after merging caller headers over the defaults.
    pub headers: HeaderMap,
    /// Optional request body.
    pub body: Option<String>,
}

/// A buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns the declared content type, if present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Returns true if the declared content type mentions `application/json`.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|value| value.to_ascii_lowercase().contains("application/json"))
    }
}

/// Failure to obtain any response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Error reported by the HTTP client.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// Any other failure to reach the server.
    #[error("{0}")]
    Unavailable(String),
}

/// Sends requests on behalf of a fetcher.
///
/// Dropping the returned future must abort the request; the fetcher relies on
/// this to release connections of superseded cycles.
pub trait Transport: Send + Sync + 'static {
    /// Sends `request` and buffers the full response.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// [`Transport`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing client, sharing its connection pool.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let client = self.client.clone();
        async move {
            let mut builder = client
                .request(request.method, request.url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?.to_vec();

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
