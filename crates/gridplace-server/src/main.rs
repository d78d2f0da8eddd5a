//! GridPlace server binary.
//!
//! Run with: cargo run -p gridplace-server -- --config gridplace.toml

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gridplace_config::GridConfig;
use gridplace_server::{build_state, router, Seed};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gridplace-server")]
#[command(about = "Grid position allocation and swap service")]
struct Cli {
    /// Configuration file (TOML or YAML)
    #[arg(short, long, default_value = "gridplace.toml")]
    config: PathBuf,

    /// Address to listen on, overrides the configuration
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// JSON seed file, overrides the configuration
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    gridplace_console::init();

    let mut config = if cli.config.exists() {
        GridConfig::load(&cli.config)?
    } else {
        warn!(path = %cli.config.display(), "configuration file not found, using defaults");
        GridConfig::default()
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(seed) = cli.seed {
        config.server.seed = Some(seed);
    }

    let seed = match &config.server.seed {
        Some(path) => Seed::load(path)?,
        None => Seed::default(),
    };
    let (state, seeded) = build_state(&config, &seed)?;
    let zones = state.zones.zone_names().count();

    // CORS for browser clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(Arc::new(state)).layer(cors);

    let listener = tokio::net::TcpListener::bind(config.server.bind).await?;
    info!(
        event = "server_start",
        bind = %config.server.bind,
        zones = zones as u64,
        establishments = seeded as u64,
    );
    axum::serve(listener, app).await?;
    Ok(())
}
