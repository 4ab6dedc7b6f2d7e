//! show-client
//!
//! Runs one show query and prints the JSON answer:
//!
//! ```text
//! show-client 'SHOW/interfaces/counters[interfaces=Ethernet0,Ethernet4][period=5]'
//! show-client --fixture dump.json 'SHOW/arp'
//! ```

use anyhow::Context;
use clap::Parser;
use sonic_cli_dispatch::Path;
use sonic_show_client::{
    build_dispatcher, DbFacade, HostCommand, MemoryFacade, RedisFacade, ShellRunner, ShowConfig,
    ShowContext,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "show-client")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = sonic_show_client::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Redis host, overrides the configuration file
    #[arg(long)]
    redis_host: Option<String>,

    /// Redis port, overrides the configuration file
    #[arg(long)]
    redis_port: Option<u16>,

    /// Serve queries from a JSON database dump instead of Redis
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Host command timeout in seconds
    #[arg(short = 't', long)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Query path, e.g. SHOW/interfaces/errors/Ethernet0
    path: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ShowConfig::load_or_default(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(host) = args.redis_host {
        config.database.redis_host = host;
    }
    if let Some(port) = args.redis_port {
        config.database.redis_port = port;
    }
    if let Some(timeout) = args.timeout {
        config.commands.host_command_timeout_secs = timeout;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate().context("invalid configuration")?;

    init_logging(&config.logging.level)?;

    let db: Arc<dyn DbFacade> = match &args.fixture {
        Some(path) => {
            info!(fixture = %path.display(), "Serving from database dump");
            Arc::new(MemoryFacade::load(path)?)
        }
        None => Arc::new(
            RedisFacade::connect(&config.database, config.connection_timeout())
                .await
                .context("failed to connect to Redis")?,
        ),
    };
    let host: Arc<dyn HostCommand> = Arc::new(ShellRunner::new(config.host_command_timeout()));

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let ctx = ShowContext::new(db, host)
        .with_max_period(config.commands.max_period_secs)
        .for_request(cancel);
    let dispatcher = build_dispatcher()?;
    let path = Path::parse(&args.path)?;
    debug!(path = %path, "Dispatching query");

    let body = dispatcher.dispatch(ctx, &path).await?;
    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over `level`.
fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))?;
    Ok(())
}

/// Cancels the in-flight query on SIGINT.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received SIGINT, cancelling query");
            cancel.cancel();
        }
    });
}
