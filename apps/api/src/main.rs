mod captioning;
mod catalog;
mod config;
mod db;
mod enrichment;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::PgMemeCatalog;
use crate::config::Config;
use crate::db::create_pool;
use crate::enrichment::{enrich_catalog, EnrichOptions, EnrichTarget};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "memegen", version, about = "Meme caption generation service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Fill in catalog metadata with the LLM, one meme at a time.
    Enrich {
        #[arg(value_enum)]
        target: EnrichTarget,
        /// Only touch memes where the column is empty.
        #[arg(long)]
        only_missing: bool,
        /// Pause between memes, in milliseconds.
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting memegen v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    let catalog = Arc::new(PgMemeCatalog::new(db));

    let llm = Arc::new(LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    )?);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, catalog, llm).await,
        Command::Enrich {
            target,
            only_missing,
            delay_ms,
        } => {
            let options = EnrichOptions {
                only_missing,
                delay: Duration::from_millis(delay_ms),
            };
            let report = enrich_catalog(catalog.as_ref(), llm.as_ref(), target, &options).await?;
            info!("Enrichment report: {}", serde_json::to_string(&report)?);
            Ok(())
        }
    }
}

async fn serve(config: &Config, catalog: Arc<PgMemeCatalog>, llm: Arc<LlmClient>) -> Result<()> {
    let pipeline = config.pipeline();
    info!(
        "Pipeline: {} lines/chunk, concurrency {}, {} attempts, {:?} timeout",
        pipeline.chunk_max_lines,
        pipeline.chunk_concurrency,
        pipeline.retry.max_attempts,
        pipeline.call_timeout
    );

    let state = AppState {
        catalog,
        llm,
        pipeline,
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
