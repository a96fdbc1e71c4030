use dailyfix_watchdog::adapters::{
    FileSessionStore, LoggingNavigator, ReqwestHttpClient, TracingNotifier,
};
use dailyfix_watchdog::cleanup::CancelRegistry;
use dailyfix_watchdog::events::{EventBus, SessionEvent};
use dailyfix_watchdog::interceptor::InterceptingClient;
use dailyfix_watchdog::logging::init_tracing;
use dailyfix_watchdog::traits::{Headers, HttpClient};
use dailyfix_watchdog::watchdog::{Collaborators, Watchdog};

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
Usage: dailyfix-watchdog [OPTIONS] <URL>...

Issues a GET to each URL through an armed session watchdog and reports
how every response was classified.

Options:
  --config <PATH>    Load watchdog settings from a JSON file
  --session <PATH>   Session file (default: ~/.dailyfix/.session.json)
  --token <TOKEN>    Send `Authorization: Bearer <TOKEN>` with each request
  --version          Print version and exit
  --help             Print this help and exit";

/// Parsed command line.
#[derive(Debug, Default)]
struct ProbeArgs {
    config: Option<PathBuf>,
    session: Option<PathBuf>,
    token: Option<String>,
    urls: Vec<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<ProbeArgs> {
    let mut parsed = ProbeArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().ok_or_else(|| eyre!("--config requires a path"))?;
                parsed.config = Some(PathBuf::from(value));
            }
            "--session" => {
                let value = args.next().ok_or_else(|| eyre!("--session requires a path"))?;
                parsed.session = Some(PathBuf::from(value));
            }
            "--token" => {
                let value = args.next().ok_or_else(|| eyre!("--token requires a value"))?;
                parsed.token = Some(value);
            }
            other if other.starts_with("--") => return Err(eyre!("unknown option: {}", other)),
            _ => parsed.urls.push(arg),
        }
    }

    Ok(parsed)
}

fn main() -> Result<()> {
    // Handle --version and --help before any initialization
    if std::env::args().any(|arg| arg == "--version") {
        println!("dailyfix-watchdog {}", VERSION);
        std::process::exit(0);
    }
    if std::env::args().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", USAGE);
        std::process::exit(0);
    }

    color_eyre::install()?;
    init_tracing("dailyfix_watchdog=info");

    let args = parse_args(std::env::args().skip(1))?;
    if args.urls.is_empty() {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(args))
}

async fn run(args: ProbeArgs) -> Result<()> {
    let session = match args.session {
        Some(path) => FileSessionStore::at(path),
        None => FileSessionStore::new().ok_or_else(|| eyre!("cannot determine home directory"))?,
    };

    let registry = CancelRegistry::new();
    let client = InterceptingClient::new(ReqwestHttpClient::with_timeout(Duration::from_secs(30))?)
        .with_registry(registry);
    let bus = EventBus::new();
    let mut signals = bus.subscribe();
    let navigator = LoggingNavigator::new();

    let collaborators = Collaborators::new(
        Arc::new(session.clone()),
        Arc::new(navigator.clone()),
        Arc::new(TracingNotifier),
    );
    let watchdog = Watchdog::builder(collaborators)
        .load_config(args.config.as_deref())?
        .bus(bus.clone())
        .arm(&client)
        .wrap_err_with(|| format!("session file: {}", session.path().display()))?;
    let classifier = watchdog.config().classifier();
    let signout_delay = watchdog.config().signout_delay();

    let mut headers = Headers::new();
    if let Some(token) = &args.token {
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));
    }

    for url in &args.urls {
        match client.get(url, &headers).await {
            Ok(response) => {
                let classification = classifier.classify(url, response.status);
                println!("{} {} {}", response.status, classification.as_str(), url);
            }
            Err(e) => println!("--- error {} ({})", url, e),
        }
    }

    // Let a started logout finish before reporting
    if watchdog.is_expiring() {
        tokio::time::sleep(signout_delay + Duration::from_millis(250)).await;
    }

    while let Ok(event) = signals.try_recv() {
        if let SessionEvent::BridgeReauthRequested { channel, reason, .. } = &event {
            println!("reauth requested: channel={} reason={}", channel, reason);
        }
    }
    if let Some(path) = navigator.last_redirect() {
        println!("redirected to {}", path);
    }

    let stats = watchdog.stats();
    println!(
        "observed={} reauth_requested={} reauth_suppressed={} expirations={}",
        stats.responses_observed, stats.reauth_requested, stats.reauth_suppressed, stats.expirations
    );

    watchdog.teardown();
    Ok(())
}
