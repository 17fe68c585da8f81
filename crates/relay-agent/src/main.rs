//! # relay-agent
//!
//! Relay server binary: loads settings, starts logging, builds the
//! downstream catalog and serves the SSE endpoint until Ctrl-C.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use relay_catalog::{CatalogFile, HttpCatalog, StaticPrompts};
use relay_server::{RelayServer, ServerConfig};
use relay_settings::{RelaySettings, ServerSettings};

/// Relay server.
#[derive(Parser, Debug)]
#[command(name = "relay-agent", about = "Session relay between clients and a downstream API")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (defaults to `~/.relay/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Maximum concurrent sessions (overrides settings).
    #[arg(long)]
    max_sessions: Option<usize>,
}

impl Cli {
    /// Command-line flags win over file and environment.
    fn apply(&self, settings: &mut RelaySettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(max) = self.max_sessions {
            settings.server.max_sessions = max;
        }
    }
}

fn server_config(server: &ServerSettings) -> ServerConfig {
    ServerConfig {
        host: server.host.clone(),
        port: server.port,
        max_sessions: server.max_sessions,
        session_timeout_secs: server.session_timeout_secs,
        heartbeat_interval_secs: server.heartbeat_interval_secs,
        send_queue_depth: server.send_queue_depth,
        protocol_version: server.protocol_version.clone(),
        name: server.name.clone(),
        version: server.version.clone(),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<CatalogFile> {
    match path {
        Some(path) => CatalogFile::load(path)
            .with_context(|| format!("Failed to load catalog: {}", path.display())),
        None => {
            tracing::warn!("no downstream.catalogPath configured, serving an empty catalog");
            Ok(CatalogFile::default())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(relay_settings::settings_path);
    let mut settings = relay_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings: {}", settings_path.display()))?;
    args.apply(&mut settings);
    settings.validate().context("Invalid settings after CLI overrides")?;

    relay_logging::init_logging(&settings.logging).context("Failed to initialize logging")?;

    let catalog = load_catalog(settings.downstream.catalog_path.as_deref().map(Path::new))?;
    let operation_count = catalog.operations.len();
    let prompt_count = catalog.prompts.len();
    let operations = HttpCatalog::from_settings(&settings.downstream, catalog.operations)
        .context("Failed to build downstream client")?;
    let prompts = StaticPrompts::new(catalog.prompts);

    let server = RelayServer::new(
        server_config(&settings.server),
        Arc::new(operations),
        Arc::new(prompts),
    );
    let handle = server.start().await.context("Failed to bind server")?;

    tracing::info!(
        downstream = %settings.downstream.base_url,
        operations = operation_count,
        prompts = prompt_count,
        "relay listening on http://{}",
        handle.addr
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("shutting down");
    server.shutdown().graceful_shutdown(handle.handles, None).await;
    tracing::info!("shutdown complete");
    Ok(())
}
