//! rota: staff availability calendar
//!
//! Usage:
//!   rota                   - Serve the availability dashboard
//!   rota --month 2024-05   - Print a month summary and exit
//!   rota --help            - Show help

mod cli;

use std::sync::Arc;

use anyhow::Context;
use rota_client::HttpBackend;
use rota_core::{AvailabilityPage, Config, YearMonth};
use rota_dashboard::{DashboardConfig, DashboardServer};
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Serve the dashboard
    Serve,
    /// Print one month and exit
    Month(YearMonth),
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1))?;

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("rota {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting rota...");
    tracing::info!("Backend: {}", config.backend.base_url);

    let backend = HttpBackend::new(&config.backend).context("Failed to create backend client")?;
    let page = AvailabilityPage::new(Arc::new(backend), config.viewer_user(), today(), config.page_settings());

    match mode {
        RunMode::Month(month) => cli::print_month(page, month).await,
        RunMode::Serve => run_server(&config, page).await,
        _ => Ok(()),
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> anyhow::Result<RunMode>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--month" | "-m" => {
                let value = args.next().context("--month needs a YYYY-MM value")?;
                let month = value
                    .parse::<YearMonth>()
                    .map_err(|e| anyhow::anyhow!("Invalid --month '{}': {}", value, e))?;
                return Ok(RunMode::Month(month));
            }
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            _ => {}
        }
    }

    Ok(RunMode::Serve)
}

/// Print help message
fn print_help() {
    println!("rota - staff availability calendar");
    println!();
    println!("Usage:");
    println!("  rota                   Serve the availability dashboard");
    println!("  rota --month YYYY-MM   Print a month summary and exit");
    println!("  rota --help            Show this help message");
    println!("  rota --version         Show version");
    println!();
    println!("Configuration is read from rota.toml when present.");
    println!();
    println!("Environment Variables:");
    println!("  ROTA_BACKEND_URL       Backend API base URL (default: http://localhost:8000/api)");
    println!("  ROTA_API_TOKEN         Bearer token for the backend");
    println!("  ROTA_TIMEOUT_SECS      Request timeout (default: 30)");
    println!("  ROTA_USER_ID           Viewer's user id");
    println!("  ROTA_USER_NAME         Viewer's display name");
    println!("  ROTA_USER_EMAIL        Viewer's email");
    println!("  ROTA_USER_ADMIN        Viewer may browse staff calendars (true/false)");
    println!("  ROTA_ALLOW_PAST_EDITS  Allow editing days before today (true/false)");
    println!("  ROTA_HOST              Dashboard host (default: 127.0.0.1)");
    println!("  ROTA_PORT              Dashboard port (default: 3000)");
}

/// Serve the dashboard until Ctrl+C
async fn run_server(config: &Config, page: AvailabilityPage) -> anyhow::Result<()> {
    let server = DashboardServer::new(DashboardConfig::from(&config.dashboard), page).with_clock(today);

    tracing::info!("Viewer: {} (admin: {})", config.viewer.name, config.viewer.is_admin);
    tracing::info!("Press Ctrl+C to exit");

    tokio::select! {
        result = server.run() => result.context("Dashboard server failed")?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down..."),
    }

    Ok(())
}
