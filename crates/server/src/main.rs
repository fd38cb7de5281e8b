use std::path::PathBuf;

use anyhow::Context;
use nutriscan_ocr::{LabelPipeline, UploadStore};
use nutriscan_server::{app, AppState, LogFormat, ServerConfig};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "nutriscan_server=info,nutriscan_ocr=info,tower_http=info";

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new(
                "nutriscan-server".into(),
                std::io::stdout,
            ))
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config path: first argument, else NUTRISCAN_CONFIG, else built-in defaults.
    let config_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("NUTRISCAN_CONFIG"))
        .map(PathBuf::from);
    let config = ServerConfig::load(config_path.as_deref()).context("loading configuration")?;

    init_tracing(config.log_format);

    let backend = config.ocr.build_backend().context("configuring OCR backend")?;
    let mut pipeline = LabelPipeline::new(backend).with_preprocess(config.preprocess.clone());
    if config.store_uploads {
        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .with_context(|| format!("creating upload directory {}", config.upload_dir.display()))?;
        pipeline = pipeline.with_store(UploadStore::new(&config.upload_dir));
        tracing::info!("Storing uploads in {}", config.upload_dir.display());
    }
    tracing::info!(backend = pipeline.backend_name(), "OCR backend ready");

    let state = AppState::new(pipeline, config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("Listening on http://{}", config.bind);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    Ok(())
}
