// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Multi-Cloud Infrastructure Manager service binary.

use std::time::Duration;

use anyhow::{Context, Result};
use dropshot::{ConfigDropshot, ConfigLogging, ConfigLoggingLevel, HttpServerStarter};
use tracing::{info, warn};

use mci_manager::config::ManagerConfig;
use mci_manager::context::ApiContext;
use mci_manager::registry;

/// Default maximum request body size (bytes).
const DEFAULT_BODY_MAX_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Drain window for graceful shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

fn print_version() {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");
    let buildstamp = option_env!("STAMP").unwrap_or("no-STAMP");
    println!("{} {} ({})", name, version, buildstamp);
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Failed to register SIGTERM handler");
            return std::future::pending().await;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Failed to register SIGINT handler");
            return std::future::pending().await;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --version and --help
    let args: Vec<String> = std::env::args().collect();
    for arg in &args[1..] {
        match arg.as_str() {
            "-V" | "--version" => {
                print_version();
                return Ok(());
            }
            "-h" | "--help" => {
                print_version();
                println!("Usage: {} [OPTIONS]", args[0]);
                println!();
                println!("Options:");
                println!("  -h, --help       Display this information");
                println!("  -V, --version    Display the program's version number");
                println!();
                println!("Environment variables:");
                println!("  TB_BIND_ADDRESS      Server bind address (default: 0.0.0.0:1323)");
                println!("  TB_SPIDER_REST_URL   Broker endpoint (default: http://localhost:1024/spider)");
                println!("  TB_STORE_DIR         Store snapshot directory (default: ./meta)");
                println!("  TB_ALLOW_ORIGINS     CORS whitelist (required)");
                println!("  TB_AUTH_ENABLED      'true' to enable auth");
                println!("  TB_AUTH_MODE         'basic' or 'jwt'");
                println!("  TB_API_USERNAME      Basic auth username");
                println!("  TB_API_PASSWORD      Basic auth password");
                println!("  TB_IAM_MANAGER_REST_URL  IAM manager endpoint (jwt mode)");
                println!("  TB_SELF_ENDPOINT     Advertised endpoint (banner only)");
                println!("  RUST_LOG             Log filter (default: mci_manager=info,dropshot=info)");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown option: {}", arg);
                std::process::exit(1);
            }
        }
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "mci_manager=info,dropshot=info".to_string()),
        ))
        .init();

    print_version();

    // Misconfiguration is fatal; an unreachable broker is not.
    let config = ManagerConfig::from_env().context("Failed to load configuration")?;
    info!(broker = %config.spider_rest_url, "Broker endpoint");
    info!(store = %config.store_dir.display(), "Store directory");

    let api_context = ApiContext::new(config.clone())
        .await
        .context("Failed to create API context")?;

    // Get API description from the trait implementation
    let api = mci_manager::api_description()
        .map_err(|e| anyhow::anyhow!("Failed to create API description: {}", e))?;

    let config_dropshot = ConfigDropshot {
        bind_address: config.bind_address,
        default_request_body_max_bytes: DEFAULT_BODY_MAX_BYTES,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };

    let config_logging = ConfigLogging::StderrTerminal {
        level: ConfigLoggingLevel::Info,
    };
    let log = config_logging
        .to_logger("mci-manager")
        .map_err(|error| anyhow::anyhow!("failed to create logger: {}", error))?;

    let server = HttpServerStarter::new(&config_dropshot, api, api_context, &log)
        .map_err(|error| anyhow::anyhow!("failed to create server: {}", error))?
        .start();

    // Routes are installed; flip readiness and push the catalog to the
    // broker in the background. An unreachable broker only defers the
    // push, it never stops the server.
    let ctx = server.app_private();
    ctx.set_ready();
    {
        let broker = ctx.broker.clone();
        let catalog = ctx.catalog.clone();
        tokio::spawn(async move {
            if let Err(e) = broker.ready().await {
                warn!(error = %e, "Broker not reachable at startup, catalog push deferred");
                return;
            }
            registry::register_all_cloud_info(&catalog, &broker).await;
        });
    }

    info!("MCI manager running on http://{}", config.bind_address);
    if !config.self_endpoint.is_empty() {
        info!("API dashboard: http://{}/tumblebug/api", config.self_endpoint);
    }

    // Wait for a shutdown signal, then drain for up to 10 seconds.
    shutdown_signal().await;
    info!("Shutdown signal received, draining for up to {:?}", DRAIN_TIMEOUT);
    match tokio::time::timeout(DRAIN_TIMEOUT, server.close()).await {
        Ok(Ok(())) => info!("Server stopped cleanly"),
        Ok(Err(e)) => warn!(error = %e, "Server reported an error during shutdown"),
        Err(_) => warn!("Drain window elapsed, exiting with requests in flight"),
    }

    Ok(())
}
