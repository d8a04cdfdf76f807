//! CLI for secure-fetch.
//!
//! Fetches JSON documents through a shared rate limiter, manages the persisted
//! theme preference and validates contact form input.

use clap::{Args as ClapArgs, Parser, Subcommand};
use futures::stream::{self, StreamExt};
use secure_fetch::fetch::{
    parse_header, HeaderError, HeaderMap, HeaderName, HeaderValue, Method, RequestOptions,
};
use secure_fetch::{
    load_config, resolve_config_path, AppConfig, ConfigError, ContactForm, FetchState,
    FetchSummary, FileStore, LogBuffer, MemoryStore, PreferenceStore, RateLimiter,
    ReqwestTransport, SecureFetcher, ThemeManager,
};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Secure Fetch - Rate-limited, validated JSON fetching.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file. Defaults to `$SECURE_FETCH_CONFIG`, then
    /// `secure-fetch.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the retained log entries as JSON before exiting.
    #[arg(long, global = true)]
    dump_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one or more JSON documents.
    Fetch(FetchArgs),

    /// Show or change the persisted theme.
    Theme {
        /// Theme to switch to.
        set: Option<String>,
    },

    /// Validate a contact form submission.
    Contact(ContactArgs),
}

#[derive(ClapArgs, Debug)]
struct FetchArgs {
    /// URLs to fetch.
    #[arg(required = true)]
    urls: Vec<String>,

    /// HTTP method.
    #[arg(long, default_value = "GET", value_parser = parse_method)]
    method: Method,

    /// Extra header as `Name: value`, replacing a configured header of the
    /// same name. May be repeated.
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(HeaderName, HeaderValue)>,

    /// Request body, passed through unchanged.
    #[arg(long)]
    body: Option<String>,

    /// Number of cycles per URL; every cycle after the first is a refetch.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    repeat: u32,

    /// Maximum URLs fetched concurrently.
    #[arg(long, default_value_t = 5)]
    concurrency: usize,
}

#[derive(ClapArgs, Debug)]
struct ContactArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    subject: String,

    #[arg(long)]
    message: String,
}

/// Failures that abort the whole run.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configured header: {0}")]
    Header(#[from] HeaderError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let logs = init_tracing();

    let args = Args::parse();
    let dump_logs = args.dump_logs;

    let code = match run(args).await {
        Ok(true) => ExitCode::from(0),
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    };

    if dump_logs {
        print_logs(&logs);
    }
    code
}

/// Initializes tracing and returns the buffer retaining recent events.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
/// - A [`LogBuffer`] keeping the last events for `--dump-logs`
fn init_tracing() -> LogBuffer {
    let logs = LogBuffer::new();
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(logs.clone())
        .init();
    logs
}

/// Main execution logic. Returns whether every operation succeeded.
async fn run(args: Args) -> Result<bool, CliError> {
    let config = load_config(&resolve_config_path(args.config.as_deref()))?;

    match args.command {
        Command::Fetch(fetch) => {
            let summary = run_fetch(&config, fetch).await?;
            print_summary(&summary);
            Ok(summary.all_success())
        }
        Command::Theme { set } => Ok(run_theme(&config, set.as_deref())),
        Command::Contact(contact) => Ok(run_contact(contact)),
    }
}

async fn run_fetch(config: &AppConfig, args: FetchArgs) -> Result<FetchSummary, CliError> {
    let limiter = Arc::new(config.rate_limit.build());
    let transport = Arc::new(ReqwestTransport::default());

    let mut overrides = HeaderMap::new();
    for (name, value) in args.headers {
        overrides.append(name, value);
    }
    let mut options = config
        .request
        .request_options()?
        .with_method(args.method)
        .with_header_overrides(overrides);
    if let Some(body) = args.body {
        options = options.with_body(body);
    }

    let repeat = args.repeat;
    let summaries: Vec<FetchSummary> = stream::iter(args.urls)
        .map(|url| {
            fetch_url(
                Arc::clone(&transport),
                Arc::clone(&limiter),
                options.clone(),
                url,
                repeat,
            )
        })
        .buffer_unordered(args.concurrency.max(1))
        .collect()
        .await;

    let mut total = FetchSummary::new();
    for summary in &summaries {
        total.merge(summary);
    }
    Ok(total)
}

/// Runs `repeat` cycles against `url` and reports each settled state.
async fn fetch_url(
    transport: Arc<ReqwestTransport>,
    limiter: Arc<RateLimiter>,
    options: RequestOptions,
    url: String,
    repeat: u32,
) -> FetchSummary {
    let mut fetcher: SecureFetcher<Value> =
        SecureFetcher::new(transport, limiter).with_options(options);
    let mut summary = FetchSummary::new();

    fetcher.fetch(url.as_str());
    for cycle in 0..repeat {
        if cycle > 0 {
            fetcher.refetch();
        }
        let state = fetcher.settled().await;
        print_state(&url, &state);
        summary.record(&state);
    }
    summary
}

fn run_theme(config: &AppConfig, set: Option<&str>) -> bool {
    let store: Box<dyn PreferenceStore> = match &config.theme.store_path {
        Some(path) => Box::new(FileStore::new(path.clone())),
        None => Box::new(MemoryStore::new()),
    };
    let mut manager = ThemeManager::load(store);

    if let Some(id) = set {
        if !manager.set_theme(id) {
            eprintln!("Unknown theme: {id}");
            return false;
        }
    }

    let theme = manager.config();
    println!("Theme: {} ({})", theme.name, theme.id);
    println!("  Classes: {}", manager.css_classes());
    println!("  Layout: {:?}", theme.layout);
    true
}

fn run_contact(args: ContactArgs) -> bool {
    let form = ContactForm {
        name: args.name,
        email: args.email,
        subject: args.subject,
        message: args.message,
    }
    .sanitized();

    match form.validate() {
        Ok(()) => {
            form.submission_summary();
            println!("Form is valid.");
            true
        }
        Err(errors) => {
            for (field, message) in errors {
                eprintln!("  {field:?}: {message}");
            }
            false
        }
    }
}

fn parse_method(raw: &str) -> Result<Method, String> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("invalid HTTP method: {raw}"))
}

fn print_state(url: &str, state: &FetchState<Value>) {
    match state {
        FetchState::Success(data) => {
            let rendered = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
            println!("{url}:\n{rendered}");
        }
        FetchState::Failure(e) => eprintln!("{url}: {e}"),
        FetchState::Loading => {}
    }
}

/// Prints the final fetch summary.
fn print_summary(summary: &FetchSummary) {
    println!("\nSummary:");
    println!("  Requested: {}", summary.requested);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed: {}", summary.failed);
    println!("  Rate limited: {}", summary.rate_limited);
}

fn print_logs(logs: &LogBuffer) {
    match serde_json::to_string_pretty(&logs.entries()) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "Failed to serialize logs"),
    }
}
