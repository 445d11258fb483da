//! Operator CLI for poking a drain-chain instance by hand.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "drainctl")]
#[command(about = "Inspect and drive a drain-chain instance", long_about = None)]
struct Cli {
    /// Base URL of the instance.
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    /// Client-side timeout in seconds.
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the health probe
    Health,
    /// Fire the pre-stop hook (blocks for the convergence delay)
    Prestop,
    /// Request one unit of work from a leaf
    Process,
    /// Call through a relay
    Call,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Health => "/health",
            Commands::Prestop => "/prestop",
            Commands::Process => "/process",
            Commands::Call => "/call",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the instance answered with a success status.
async fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()?;

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let start = Instant::now();
    let res = client.get(&url).send().await?;
    let elapsed = start.elapsed();

    let status = res.status();
    let text = res.text().await?;
    println!("{} {} ({} ms)", status.as_u16(), url, elapsed.as_millis());

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }

    Ok(status.is_success())
}
