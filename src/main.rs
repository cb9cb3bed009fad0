//! JELAI admin dashboard
//!
//! Desktop client for the learn-dashboard proxy: course material uploads,
//! learning objectives, agent prompts, analytics and courses.

mod analytics;
mod api;
mod app;
mod config;
mod error;
mod notify;
mod upload;
mod utils;

use api::ProxyClient;
use app::{AdminDashboard, Backend};
use clap::Parser;
use config::{AdminConfig, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;
use upload::FileSelector;

#[derive(Parser, Debug)]
#[command(name = "jelai-admin", about = "JELAI admin dashboard", version)]
struct CliArgs {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Dashboard base URL, e.g. http://localhost:8000/services/learn-dashboard
    #[arg(long, env = "JELAI_ADMIN_URL")]
    base_url: Option<String>,

    /// API token sent with every request
    #[arg(long, env = "JELAI_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("jelai_admin={}", args.log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match AdminConfig::load(&args.config) {
        Ok(config) => config.with_overrides(args.base_url, args.token),
        Err(e) => {
            tracing::error!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let selector = match FileSelector::new(&config.exclude_patterns) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::error!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match ProxyClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let backend = Backend::new(client, runtime.handle().clone());
    let notification_ttl = config.notification_ttl();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([900.0, 800.0])
            .with_min_inner_size([600.0, 500.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        "JELAI Admin Dashboard",
        options,
        Box::new(move |cc| {
            Box::new(AdminDashboard::new(cc, backend, selector, notification_ttl))
        }),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Dashboard window failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
