// SPDX-License-Identifier: Apache-2.0

//! Binary entry point for the bugcap HTTP server.

use std::sync::Arc;

use anyhow::Context;
use bugcap_core::{EnvCredentialProvider, load_config};
use bugcap_server::{AppState, run_http};
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// HTTP server exposing the bugcap issue suggestion pipeline.
#[derive(Parser)]
#[command(name = "bugcap-server", version, about)]
struct Args {
    /// Address to bind (defaults to `[server].host`)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (defaults to `[server].port`)
    #[arg(long, short = 'p')]
    port: Option<u16>,
}

fn init_logging() {
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bugcap=info,bugcap_core=info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    let config = load_config().context("Failed to load configuration")?;
    let credentials = EnvCredentialProvider::new(&config.jira);
    let state = AppState::from_config(&credentials, &config);
    if !state.is_configured() {
        tracing::warn!("Serving /health only until credentials are configured");
    }

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    tracing::info!("Starting bugcap server on {}:{}", host, port);

    run_http(&host, port, Arc::new(state)).await
}
