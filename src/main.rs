//! suggestions: exercise the autocomplete engine from a terminal.
//!
//! Usage:
//!   suggestions lookup --candidates <file> <input>     # Match a static list
//!   suggestions request --service-url <url> <input>    # Preview a remote lookup
//!   suggestions replay --candidates <file> <inputs>... # Type inputs through the driver

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use suggestions::config::{normalize_lookup, MatchMode};
use suggestions::driver::Driver;
use suggestions::engine::normalize_query;
use suggestions::fmt::{fmt_request, TerminalRenderer};
use suggestions::transport::{CancelHandle, LookupRequest, Transport};
use suggestions::{Options, QueryEngine, RequestToken, Suggestion, TransportError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "suggestions")]
#[command(about = "Autocomplete query engine playground")]
#[command(version)]
struct Cli {
    /// JSON options file (camelCase keys, e.g. {"minChars": 2})
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match an input against a static candidate list
    Lookup {
        /// JSON array of strings or {"value", "data"} objects
        #[arg(short, long)]
        candidates: PathBuf,

        /// Match prefixes instead of substrings
        #[arg(long)]
        prefix: bool,

        /// Input text
        input: String,
    },

    /// Print the remote lookup that an input would send
    Request {
        /// Lookup endpoint
        #[arg(long)]
        service_url: String,

        /// Body key carrying the query
        #[arg(long, default_value = "query")]
        param_name: String,

        /// Extra request parameter (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Leave extra parameters out of the body
        #[arg(long)]
        ignore_params: bool,

        /// Input text
        input: String,
    },

    /// Feed a sequence of inputs through the async driver
    Replay {
        /// JSON array of strings or {"value", "data"} objects
        #[arg(short, long)]
        candidates: PathBuf,

        /// Serve candidates through a simulated remote source
        #[arg(long)]
        remote: bool,

        /// Simulated lookup latency in milliseconds
        #[arg(long, default_value = "0")]
        latency_ms: u64,

        /// Debounce window in milliseconds
        #[arg(long, default_value = "0")]
        defer_ms: u64,

        /// Pause between inputs in milliseconds
        #[arg(long, default_value = "50")]
        interval_ms: u64,

        /// Inputs, typed in order
        #[arg(required = true)]
        inputs: Vec<String>,
    },
}

/// Transport for purely local commands; lookups are dropped.
struct Offline;

impl Transport for Offline {
    fn send(&mut self, request: LookupRequest) -> CancelHandle {
        tracing::warn!("No transport configured, dropping lookup {}", request.token);
        CancelHandle::noop()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Log to stderr only (stdout carries rendered suggestions)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("suggestions=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let color = !cli.no_color && std::io::stdout().is_terminal();
    let base = match &cli.options {
        Some(path) => Options::from_path(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => Options::default(),
    };

    match cli.command {
        Commands::Lookup {
            candidates,
            prefix,
            input,
        } => run_lookup(base, &candidates, prefix, &input, color),
        Commands::Request {
            service_url,
            param_name,
            params,
            ignore_params,
            input,
        } => {
            let mut options = Options {
                service_url: Some(service_url.into()),
                param_name,
                ignore_params,
                ..base
            };
            options.params.extend(params);
            options.validate()?;
            let query = normalize_query(&input, options.lowercase_query);
            let request = LookupRequest::build(&options, RequestToken::new(1), &query)
                .context("no service URL configured")?;
            fmt_request(&mut std::io::stdout().lock(), &request, color)?;
            Ok(())
        }
        Commands::Replay {
            candidates,
            remote,
            latency_ms,
            defer_ms,
            interval_ms,
            inputs,
        } => {
            let replay = Replay {
                remote,
                latency: Duration::from_millis(latency_ms),
                defer: Duration::from_millis(defer_ms),
                interval: Duration::from_millis(interval_ms),
            };
            run_replay(base, &candidates, replay, inputs, color).await
        }
    }
}

fn run_lookup(
    base: Options,
    candidates: &Path,
    prefix: bool,
    input: &str,
    color: bool,
) -> anyhow::Result<()> {
    let mut options = Options {
        lookup: Some(load_candidates(candidates)?),
        service_url: None,
        ..base
    };
    if prefix {
        options.match_mode = MatchMode::Prefix;
    }

    let renderer = TerminalRenderer::new(std::io::stdout(), color);
    let mut engine = QueryEngine::new(options, Offline, renderer)?;
    let resolution = engine.on_input_changed(input, std::time::Instant::now());
    tracing::info!("Resolved {input:?}: {resolution:?}");
    Ok(())
}

struct Replay {
    remote: bool,
    latency: Duration,
    defer: Duration,
    interval: Duration,
}

async fn run_replay(
    base: Options,
    candidates: &Path,
    replay: Replay,
    inputs: Vec<String>,
    color: bool,
) -> anyhow::Result<()> {
    let candidates = load_candidates(candidates)?;
    let driver = Driver::new();

    let mut options = Options {
        defer_request_by: replay.defer,
        ..base
    };
    if replay.remote {
        options.lookup = None;
        options.service_url = Some("memory://candidates".into());
    } else {
        options.lookup = Some(candidates.clone());
    }

    let latency = replay.latency;
    let transport = driver.fetch_transport(move |request: LookupRequest| {
        let needle = request.query.to_lowercase();
        let hits: Vec<Suggestion> = candidates
            .iter()
            .filter(|c| c.value.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        async move {
            tokio::time::sleep(latency).await;
            Ok::<_, TransportError>(hits)
        }
    });

    let renderer = TerminalRenderer::new(std::io::stdout(), color);
    let engine = QueryEngine::new(options, transport, renderer)?;
    let handle = driver.spawn(engine);

    for input in inputs {
        tracing::info!("Typing {input:?}");
        handle.input(input);
        tokio::time::sleep(replay.interval).await;
    }
    // Let the last debounce window and lookup settle.
    tokio::time::sleep(replay.defer + replay.latency).await;

    if let Some(snapshot) = handle.snapshot().await {
        tracing::info!(
            "Final state: visible={} suggestions={} cached={}",
            snapshot.visible,
            snapshot.suggestions.len(),
            snapshot.cached_queries
        );
    }
    handle.dispose().await;
    Ok(())
}

fn load_candidates(path: &Path) -> anyhow::Result<Vec<Suggestion>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading candidates from {}", path.display()))?;
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(&json).context("candidates must be a JSON array")?;
    Ok(normalize_lookup(entries))
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}
