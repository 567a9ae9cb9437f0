use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use comet_core::TickStorage;
use comet_feeds::pipeline::{default_sources, DEFAULT_FETCH_INTERVAL};
use comet_feeds::{FetchLoop, NewsHub};
use comet_storage::MemoryTickStore;
use comet_web::{create_app, AppState};

#[derive(Parser)]
#[command(name = "comet", about = "Commodity market terminal backend", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP/WebSocket server with both background loops
    Serve {
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: String,

        /// News poll interval in seconds
        #[arg(long, default_value_t = 25)]
        fetch_interval: u64,

        /// Tick generation interval in seconds
        #[arg(long, default_value_t = 1)]
        tick_interval: u64,
    },
    /// Run one news fetch cycle and print the normalized items as JSON lines
    FetchOnce,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            addr,
            fetch_interval,
            tick_interval,
        } => {
            serve(
                addr,
                Duration::from_secs(fetch_interval),
                Duration::from_secs(tick_interval),
            )
            .await
        }
        Commands::FetchOnce => fetch_once().await,
    }
}

async fn serve(
    addr: String,
    fetch_interval: Duration,
    tick_interval: Duration,
) -> anyhow::Result<()> {
    let storage: Arc<dyn TickStorage> = Arc::new(MemoryTickStore::new());
    let state = Arc::new(AppState::with_intervals(
        storage,
        fetch_interval,
        tick_interval,
    ));

    state.market.seed_symbol("NG", 3.5);
    state.market.seed_symbol("WTI", 80.0);

    state.start_news_loop(default_sources()).await?;
    state.start_tick_loop().await;

    let app = create_app(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "comet listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install ctrl-c handler");
    }
}

async fn fetch_once() -> anyhow::Result<()> {
    let hub = Arc::new(NewsHub::default());
    let fetch_loop = FetchLoop::new(hub, default_sources(), DEFAULT_FETCH_INTERVAL)?;
    let batch = fetch_loop.run_cycle().await;
    for item in &batch {
        println!("{}", serde_json::to_string(item)?);
    }
    info!(items = batch.len(), "fetch cycle complete");
    Ok(())
}
