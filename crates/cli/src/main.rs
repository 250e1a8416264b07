use anyhow::Context;
use clap::{Parser, Subcommand};
use llm_trade_agent::{fetch_snapshot, Snapshot};
use llm_trade_core::{AppConfig, ConfigLoader, ExecutionMode, DEFAULT_CONFIG_PATH};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

mod signals;
mod wiring;

#[derive(Parser)]
#[command(name = "llm-trade")]
#[command(about = "LLM-driven trading agent for Bitget USDT-margined futures", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Execution mode override: paper or live
    #[arg(long, global = true)]
    mode: Option<ExecutionMode>,

    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the decision loop until SIGINT or SIGTERM
    Run,
    /// Run a single decision cycle and print its report
    Once,
    /// Show the position the broker currently reports
    Position,
    /// Validate configuration and report which credentials are present
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = load_config(&cli.config, cli.mode)?;

    match cli.command {
        Commands::Run => run_agent(config).await?,
        Commands::Once => run_once(config).await?,
        Commands::Position => show_position(config).await?,
        Commands::CheckConfig => check_config(&config)?,
    }

    Ok(())
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

fn load_config(path: &Path, mode: Option<ExecutionMode>) -> anyhow::Result<AppConfig> {
    let mut config = ConfigLoader::load(Some(path))?;
    if let Some(mode) = mode {
        config.trading.mode = mode;
    }
    Ok(config)
}

async fn run_agent(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(
        mode = ?config.trading.mode,
        symbol = %config.trading.symbol,
        timeframe = %config.trading.timeframe,
        leverage = config.trading.leverage,
        model = %config.oracle.model,
        "Starting trading agent"
    );
    if config.trading.mode == ExecutionMode::Live {
        tracing::warn!("LIVE MODE: orders will be sent to Bitget with real funds");
    }

    let agent = wiring::build_agent(&config).await?;

    let shutdown = signals::ShutdownSignals::register().context("Cannot listen for shutdown signals")?;
    let (stop_tx, stop_rx) = watch::channel(false);
    signals::forward_shutdown(shutdown, stop_tx);

    let stats = agent.run(stop_rx).await;

    println!();
    println!("=== Session Summary ===");
    println!("{}", stats.summary());
    Ok(())
}

async fn run_once(config: AppConfig) -> anyhow::Result<()> {
    let mut agent = wiring::build_agent(&config).await?;
    let report = agent.run_cycle().await;

    println!("{}", report.summary());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn show_position(config: AppConfig) -> anyhow::Result<()> {
    if config.trading.mode == ExecutionMode::Paper {
        tracing::info!("Paper mode keeps positions in memory; a fresh process is always flat");
    }

    let broker = wiring::build_broker(&config, false).await?;
    match fetch_snapshot(broker.as_ref(), &config.trading.symbol).await {
        Snapshot::Known(state) => {
            println!("{}", state.status_line(&config.trading.symbol));
            Ok(())
        }
        Snapshot::Unknown { cause } => anyhow::bail!("Position unknown: {cause}"),
    }
}

fn check_config(config: &AppConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    println!();

    let credentials = wiring::credentials(config);
    for credential in &credentials {
        let status = match (credential.present, credential.required) {
            (true, _) => "set",
            (false, true) => "MISSING (required)",
            (false, false) => "not set",
        };
        println!("{:<24} {status}", credential.name);
    }

    let missing: Vec<&str> = credentials
        .iter()
        .filter(|c| c.required && !c.present)
        .map(|c| c.name.as_str())
        .collect();
    if !missing.is_empty() {
        anyhow::bail!("Missing required credentials: {}", missing.join(", "));
    }

    println!();
    println!("Configuration OK ({:?} mode)", config.trading.mode);
    Ok(())
}
