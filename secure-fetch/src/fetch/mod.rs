//! Rate-limited, validated JSON fetching.
//!
//! A [`SecureFetcher`] owns one logical fetch slot. Each call to
//! [`SecureFetcher::fetch`] with a new URL starts a cycle that:
//!
//! 1. publishes [`FetchState::Loading`],
//! 2. asks the shared [`RateLimiter`] to admit the URL,
//! 3. rejects anything but `http`/`https` URLs,
//! 4. sends the request with merged default headers,
//! 5. requires a success status and a JSON content type,
//! 6. parses the body, rejecting `null`,
//! 7. publishes [`FetchState::Success`] or [`FetchState::Failure`].
//!
//! Starting a new cycle supersedes the previous one: its task is aborted,
//! dropping the in-flight request, and its cycle token is invalidated so a
//! result that races the abort is discarded instead of published.

mod error;
mod request;
mod state;
mod transport;

pub use error::{FetchError, FetchErrorKind, HeaderError};
pub use request::{header_pair, parse_header, RequestOptions};
pub use state::FetchState;
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
pub use reqwest::Method;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

use crate::rate_limit::RateLimiter;
use crate::security::{generate_secure_id, parse_http_url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use url::Url;

/// Identifies one fetch cycle; stale once a newer cycle starts.
#[derive(Debug, Clone)]
struct CycleToken {
    id: u64,
    generation: Arc<AtomicU64>,
}

impl CycleToken {
    fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.id
    }
}

/// The cycle currently owning the fetch slot.
#[derive(Debug)]
struct ActiveCycle {
    url: String,
    task: JoinHandle<()>,
}

/// Successful cycle output.
struct Fetched<T> {
    data: T,
    /// Origin and path only; query strings are kept out of logs.
    log_url: String,
    items: Option<usize>,
}

/// Fetch controller publishing a [`FetchState`] per target URL.
///
/// `T` is the type the JSON body is deserialised into; use
/// [`serde_json::Value`] to accept any non-null document.
pub struct SecureFetcher<T, X = ReqwestTransport> {
    transport: Arc<X>,
    limiter: Arc<RateLimiter>,
    options: Arc<RequestOptions>,
    state: Arc<watch::Sender<FetchState<T>>>,
    generation: Arc<AtomicU64>,
    current: Option<ActiveCycle>,
}

impl<T, X> SecureFetcher<T, X>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    X: Transport,
{
    /// Creates an idle fetcher. The initial state is [`FetchState::Loading`].
    pub fn new(transport: Arc<X>, limiter: Arc<RateLimiter>) -> Self {
        let (state, _) = watch::channel(FetchState::Loading);
        Self {
            transport,
            limiter,
            options: Arc::new(RequestOptions::default()),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            current: None,
        }
    }

    /// Sets the options applied to every subsequent cycle.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = Arc::new(options);
        self
    }

    /// Targets `url`, starting a new cycle if it differs from the current one.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn fetch(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.current.as_ref().is_some_and(|cycle| cycle.url == url) {
            return;
        }
        self.start_cycle(url);
    }

    /// Starts a fresh cycle for the current URL. Does nothing if no URL is set.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn refetch(&mut self) {
        if let Some(url) = self.current.as_ref().map(|cycle| cycle.url.clone()) {
            self.start_cycle(url);
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// Waits until the state leaves [`FetchState::Loading`] and returns it.
    ///
    /// Never resolves if no cycle was started or the fetcher was detached
    /// mid-flight.
    pub async fn settled(&self) -> FetchState<T> {
        let mut receiver = self.state.subscribe();
        let settled = match receiver.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    fn start_cycle(&mut self, url: String) {
        self.abort_current();

        let generation = Arc::clone(&self.generation);
        let mut id = 0;
        self.state.send_modify(|state| {
            id = generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = FetchState::Loading;
        });
        let token = CycleToken { id, generation };

        let span = info_span!("fetch", request_id = %generate_secure_id(), cycle = id);
        let task = tokio::spawn(
            run_cycle(
                Arc::clone(&self.transport),
                Arc::clone(&self.limiter),
                Arc::clone(&self.options),
                url.clone(),
                token,
                Arc::clone(&self.state),
            )
            .instrument(span),
        );

        self.current = Some(ActiveCycle { url, task });
    }
}

impl<T, X> SecureFetcher<T, X> {
    /// Returns the URL of the current cycle.
    pub fn url(&self) -> Option<&str> {
        self.current.as_ref().map(|cycle| cycle.url.as_str())
    }

    /// Cancels the current cycle and forgets its URL.
    ///
    /// The published state is left as is; a later [`fetch`](Self::fetch)
    /// starts over even for the same URL.
    pub fn detach(&mut self) {
        let generation = &self.generation;
        self.state.send_if_modified(|_| {
            generation.fetch_add(1, Ordering::SeqCst);
            false
        });
        self.abort_current();
    }

    fn abort_current(&mut self) {
        if let Some(cycle) = self.current.take() {
            if !cycle.task.is_finished() {
                debug!(url = %cycle.url, "Aborting superseded fetch");
            }
            cycle.task.abort();
        }
    }
}

impl<T, X> Drop for SecureFetcher<T, X> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Runs one cycle to completion and publishes its outcome.
async fn run_cycle<T, X>(
    transport: Arc<X>,
    limiter: Arc<RateLimiter>,
    options: Arc<RequestOptions>,
    url: String,
    token: CycleToken,
    state: Arc<watch::Sender<FetchState<T>>>,
) where
    T: DeserializeOwned + Send + Sync + 'static,
    X: Transport,
{
    match execute::<T, X>(&transport, &limiter, &options, &url).await {
        Ok(fetched) => {
            if publish(&state, &token, FetchState::Success(fetched.data)) {
                info!(
                    url = %fetched.log_url,
                    data_length = ?fetched.items,
                    "API request successful"
                );
            }
        }
        Err(e) => {
            let kind = e.kind();
            let message = e.to_string();
            if publish(&state, &token, FetchState::Failure(e)) {
                match kind {
                    FetchErrorKind::RateLimited | FetchErrorKind::InvalidUrl => {
                        warn!(url = %url, error = %message, "API request rejected");
                    }
                    _ => error!(url = %url, error = %message, "API request failed"),
                }
            }
        }
    }
}

/// Publishes `next` unless the cycle has been superseded.
///
/// The check runs under the channel's write lock, the same lock a new cycle
/// takes to bump the generation, so a stale cycle can never overwrite the
/// `Loading` state of its successor.
fn publish<T>(
    state: &watch::Sender<FetchState<T>>,
    token: &CycleToken,
    next: FetchState<T>,
) -> bool {
    let mut next = Some(next);
    let published = state.send_if_modified(|current| {
        if !token.is_current() {
            return false;
        }
        if let Some(next) = next.take() {
            *current = next;
        }
        true
    });
    if !published {
        debug!(cycle = token.id, "Discarding result of superseded fetch");
    }
    published
}

/// Admission, validation, request and response checks for one cycle.
async fn execute<T, X>(
    transport: &X,
    limiter: &RateLimiter,
    options: &RequestOptions,
    url: &str,
) -> Result<Fetched<T>, FetchError>
where
    T: DeserializeOwned,
    X: Transport,
{
    if !limiter.is_allowed(url) {
        return Err(FetchError::RateLimited);
    }

    let target = parse_http_url(url).ok_or(FetchError::InvalidUrl)?;
    let log_url = origin_and_path(&target);
    info!(url = %log_url, method = %options.method(), "API request started");

    let response = transport
        .send(options.to_request(target))
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    if !response.status.is_success() {
        return Err(FetchError::Http {
            status: response.status.as_u16(),
        });
    }

    if !response.is_json() {
        return Err(FetchError::InvalidContentType);
    }

    let value: Value =
        serde_json::from_slice(&response.body).map_err(|e| FetchError::Parse(e.to_string()))?;
    if value.is_null() {
        return Err(FetchError::InvalidData);
    }

    let items = value.as_array().map(Vec::len);
    let data = serde_json::from_value(value).map_err(|e| FetchError::Parse(e.to_string()))?;

    Ok(Fetched {
        data,
        log_url,
        items,
    })
}

fn origin_and_path(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}
