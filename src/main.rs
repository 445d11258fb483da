//! drain-chain service entry point.
//!
//! ```text
//!   client ──▶ relay (/call) ──▶ leaf (/process)
//!                │                  │
//!   orchestrator ├─ GET /health ────┤  200 "ok" | 503 "draining"
//!                ├─ GET /prestop ───┤  wait convergence, then drain
//!                └─ SIGTERM ────────┘  ensure drain, finish in-flight, exit 0
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use drain_chain::config::{self, validation::validate_config, ConfigError, Role};
use drain_chain::error::ServiceError;
use drain_chain::lifecycle::{signals::TerminationListener, startup};
use drain_chain::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "drain-chain")]
#[command(about = "Leaf or relay service with coordinated graceful termination", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Role of this instance; overrides the config file.
    #[arg(short, long, value_enum)]
    role: Option<Role>,

    /// Bind address; overrides the config file and BIND_ADDRESS.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("drain-chain: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        role = %config.role,
        bind_address = %config.listener.bind_address,
        convergence_delay_ms = config.drain.convergence_delay_ms,
        "drain-chain starting"
    );

    match serve(config).await {
        Ok(()) => {
            tracing::info!("Process exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

fn load(cli: &Cli) -> Result<config::ServiceConfig, ConfigError> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(role) = cli.role {
        config.role = role;
    }
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

async fn serve(config: config::ServiceConfig) -> Result<(), ServiceError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let termination = TerminationListener::install()?;
    let listener = startup::bind(&config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    startup::run(config, listener, termination.recv()).await
}
