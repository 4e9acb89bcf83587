mod config;
mod error;
mod media;
mod ml;
mod pipeline;
mod server;
mod storage;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use crate::config::Config;
use crate::ml::engine::{AutoencoderEngine, Reconstructor};
use crate::server::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the HTTP server on.
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: String,

    #[arg(long)]
    model_path: Option<PathBuf>,

    #[arg(long)]
    storage_dir: Option<PathBuf>,

    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Per-frame reconstruction-error threshold.
    #[arg(long)]
    threshold: Option<f32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = Config::default();
    if let Some(p) = args.model_path {
        config.model_path = p;
    }
    if let Some(p) = args.storage_dir {
        config.storage_dir = p;
    }
    if let Some(p) = args.temp_dir {
        config.temp_dir = p;
    }
    if let Some(t) = args.threshold {
        config.threshold = t;
    }

    fs::create_dir_all(&config.storage_dir)?;
    fs::create_dir_all(&config.temp_dir)?;

    info!("Crowd anomaly detection backend starting");
    info!("Storage: {:?}", config.storage_dir);

    // A missing model degrades the service to "model not loaded" responses
    // rather than crashing the process.
    let engine: Option<Arc<dyn Reconstructor>> = match AutoencoderEngine::new(&config.model_path) {
        Ok(engine) => {
            info!("Model loaded successfully");
            Some(Arc::new(engine))
        }
        Err(e) => {
            error!("Model load failed: {}", e);
            None
        }
    };

    let state = AppState {
        engine,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!("Listening on {}", args.bind);
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
