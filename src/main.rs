use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use architracker::config::{Cli, Command, FetchArgs, ServeArgs};
use architracker::{
    build_router, print_snapshot, snapshot_url, write_snapshot_csv, AppState, HttpTrackerClient,
    RoomRegistry, TrackerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = TrackerConfig::from(&cli.tracker);

    match cli.command {
        Command::Serve(args) => serve(config, args).await,
        Command::Fetch(args) => fetch(config, args).await,
    }
}

async fn serve(config: TrackerConfig, args: ServeArgs) -> Result<()> {
    info!(
        "Starting {} v{} (tracker domain {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.domain
    );

    let registry = RoomRegistry::connect(&args.database_url)
        .await
        .context("opening room registry")?;
    let client = HttpTrackerClient::new(&config).context("building tracker client")?;

    let state = AppState::new(registry, Arc::new(client), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

async fn fetch(config: TrackerConfig, args: FetchArgs) -> Result<()> {
    let client = HttpTrackerClient::new(&config).context("building tracker client")?;
    let snapshot = snapshot_url(&client, &config, &args.url).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }

    if let Some(dir) = args.csv {
        let (players, hints) = write_snapshot_csv(&snapshot, &dir)?;
        info!("Wrote {} and {}", players.display(), hints.display());
    }

    Ok(())
}
