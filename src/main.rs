use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::Level;

use sql_gateway::db::{DbDescriptor, GatewayConfig};
use sql_gateway::server;

/// HTTP/JSON gateway for embedded SQLite databases.
#[derive(Debug, Parser)]
#[command(name = "sql-gateway", version, about)]
struct Args {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    bind_host: Option<String>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Serve static files from this directory
    #[arg(long)]
    serve_dir: Option<PathBuf>,

    /// Register a database from a bare file path; its id is the file stem
    #[arg(long = "db")]
    quick_dbs: Vec<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn build_config(args: &Args) -> Result<GatewayConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read '{}': {e}", path.display()))?;
            serde_yaml::from_str(&text)
                .map_err(|e| format!("cannot parse '{}': {e}", path.display()))?
        }
        None => GatewayConfig::default(),
    };

    if let Some(bind_host) = &args.bind_host {
        config.bind_host = bind_host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(serve_dir) = &args.serve_dir {
        config.serve_dir = Some(serve_dir.clone());
    }
    for path in &args.quick_dbs {
        let id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| format!("cannot derive a database id from '{}'", path.display()))?;
        config
            .databases
            .push(DbDescriptor::new(id, path.display().to_string()));
    }

    if config.databases.is_empty() && config.serve_dir.is_none() {
        return Err("nothing to serve: configure at least one database or a serve dir".into());
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(args.log_level)
        .init();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    let handle = match server::launch(config).await {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!("startup failed: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for shutdown signal: {err}");
    }
    tracing::info!("shutting down");
    handle.shutdown().await;
}
