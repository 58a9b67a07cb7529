//! GTrader gateway entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gtrader_gateway::api::{create_router, AppState};
use gtrader_gateway::config::Config;
use gtrader_gateway::metrics;
use gtrader_gateway::myriad::{MarketsParams, MyriadClient};
use gtrader_gateway::state::BotStatus;
use gtrader_gateway::utils::shutdown_signal;

/// GTrader REST gateway for bot state and the Myriad Protocol API.
#[derive(Parser, Debug)]
#[command(name = "gtrader-gateway")]
#[command(about = "REST gateway for the GTrader bot and Myriad Protocol markets")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT from the environment).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway server (default).
    Run {
        /// HTTP server port (overrides PORT from the environment).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Check connectivity to the Myriad API.
    CheckUpstream,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("gtrader_gateway=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::CheckUpstream) => cmd_check_upstream().await,
        Some(Command::Run { port }) => cmd_run(port).await,
        None => cmd_run(args.port).await,
    }
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("GTRADER GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Upstream URL: {}", config.myriad_api_url);
    println!(
        "  API Key: {}",
        if config.myriad_api_key.is_some() {
            "present"
        } else {
            "absent (unauthenticated)"
        }
    );
    println!("  HTTP Timeout: {}s", config.http_timeout_secs);
    println!("  Assets: {}", config.assets);
    println!("  Interval: {}", config.interval);
    println!("  Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Check connectivity to the Myriad API.
async fn cmd_check_upstream() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("GTRADER GATEWAY - UPSTREAM CHECK");
    println!("======================================================================");

    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    println!("Host: {}", config.myriad_api_url);
    println!(
        "API Key: {}",
        if config.myriad_api_key.is_some() {
            "present"
        } else {
            "absent"
        }
    );
    println!("======================================================================");

    print!("\n1. Creating client... ");
    let client = MyriadClient::new(&config)?;
    println!("OK");

    print!("\n2. Fetching one market... ");
    let params = MarketsParams {
        limit: 1,
        ..MarketsParams::default()
    };
    match client.markets(&params).await {
        Ok(_) => {
            println!("OK");
            println!("   Upstream reachable");
        }
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
            return Err(anyhow::anyhow!("Upstream check failed"));
        }
    }

    println!("\n======================================================================");
    println!("UPSTREAM CHECK COMPLETED");
    println!("======================================================================");

    Ok(())
}

/// Run the gateway server.
async fn cmd_run(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Some(port) = port_override {
        config.port = port;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Configuration loaded successfully");
    info!("Upstream: {}", config.myriad_api_url);
    info!("Assets: {}", config.assets);
    info!("Interval: {}", config.interval);

    // Install the Prometheus recorder before any metric is touched.
    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?;
    metrics::init_metrics();

    let client = MyriadClient::new(&config)?;
    let app_state = AppState::new(&config, client).with_prometheus(prometheus);

    // Startup transition, mirrored by the shutdown one below.
    let bot_state = app_state.state.clone();
    bot_state.set_status(BotStatus::Running).await;
    bot_state.touch().await;
    info!("GTrader gateway starting up");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    bot_state.set_status(BotStatus::Stopped).await;
    info!("GTrader gateway shut down");

    Ok(())
}
