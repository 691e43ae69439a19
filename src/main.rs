//! MartingaleBot - Main Entry Point
//!
//! Connects to a MetaTrader 5 bridge (or a paper account) and runs the
//! martingale polling loop until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use martingale_bot::config::{load_config, AppConfig, LogFormat};
use martingale_bot::{
    DriverSettings, Gateway, MartingaleStrategy, Mt5Gateway, PaperGateway, PollingDriver,
    StrategyParameters, TokioClock,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format; overrides the config file
    #[arg(long, value_parser = ["text", "json"])]
    log_format: Option<String>,

    /// Trade against an in-memory paper account instead of the bridge
    #[arg(long)]
    paper: bool,

    /// Bid/ask of the paper account
    #[arg(long, requires = "paper")]
    paper_price: Option<Decimal>,

    /// Contract size of the paper instrument
    #[arg(long, default_value = "100")]
    paper_contract_size: Decimal,

    /// Instrument symbol; overrides the config file
    #[arg(long)]
    symbol: Option<String>,
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Connect, run the loop until Ctrl-C, disconnect
async fn run_bot<G: Gateway + 'static>(
    gateway: Arc<G>,
    params: StrategyParameters,
    config: &AppConfig,
) -> Result<()> {
    gateway
        .connect()
        .await
        .with_context(|| format!("Failed to connect {} gateway", gateway.gateway_name()))?;

    let mut driver = PollingDriver::new(
        Arc::clone(&gateway),
        MartingaleStrategy::new(params),
        TokioClock,
        DriverSettings::from(&config.settings),
    );
    driver.run_until(shutdown_signal()).await;

    info!("Received shutdown signal, cleaning up...");
    if let Err(e) = gateway.disconnect().await {
        error!(error = %e, "Disconnect failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let mut config = load_config(Some(args.config.as_str())).context("Failed to load configuration")?;
    if let Some(symbol) = args.symbol {
        config.strategy.symbol = symbol;
    }

    let log_level = args
        .log_level
        .unwrap_or_else(|| config.settings.log_level.clone());
    let log_format = match args.log_format.as_deref() {
        Some("json") => LogFormat::Json,
        Some(_) => LogFormat::Text,
        None => config.settings.log_format,
    };
    init_logging(&log_level, log_format)?;

    info!("Starting MartingaleBot");
    info!("Configuration file: {}", args.config);

    let params = StrategyParameters::try_from(&config.strategy)
        .context("Invalid strategy configuration")?;
    info!(
        symbol = params.instrument(),
        start_lot = %params.start_lot_size(),
        lot_multiplier = %params.lot_multiplier(),
        profit_margin = %params.profit_margin(),
        threshold_distance = %params.threshold_distance(),
        close_check_period = params.close_check_period(),
        timeframe = %params.timeframe(),
        paper = args.paper,
        "Strategy parameters"
    );

    if args.paper {
        let gateway = Arc::new(PaperGateway::new(params.instrument(), args.paper_contract_size));
        if let Some(price) = args.paper_price {
            gateway.set_quote(price, price);
        }
        run_bot(gateway, params, &config).await
    } else {
        let gateway = Arc::new(
            Mt5Gateway::new(config.broker.clone())
                .context("Failed to build MT5 gateway")?
                .with_symbol(params.instrument()),
        );
        run_bot(gateway, params, &config).await
    }
}
