//! Moment extraction worker binary.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mclip_ai::{select_provider, ProviderSelection};
use mclip_worker::{discover_inputs, run_batch, FolderWatcher, JsonReportSink, Pipeline, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,mclip=debug"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    info!("Starting mclip-worker");

    let config = WorkerConfig::from_env();
    config.validate().context("invalid configuration")?;
    info!("Worker config: {:?}", config);

    let provider = select_provider(&config.provider).unwrap_or_else(|e| {
        warn!("Scoring provider unavailable, scoring locally: {}", e);
        ProviderSelection::from(e)
    });

    let sink = Arc::new(JsonReportSink::new(&config.output_dir));
    let pipeline = Arc::new(Pipeline::new(config.pipeline.clone(), provider, sink));
    info!(provider = pipeline.provider_name(), "Pipeline ready");

    if config.watch {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
        });

        let mut watcher = FolderWatcher::new(pipeline, &config);
        watcher.run(shutdown_rx).await?;
    } else {
        let inputs = discover_inputs(&config.input_dir)
            .await
            .with_context(|| format!("cannot read {}", config.input_dir.display()))?;
        if inputs.is_empty() {
            warn!(dir = %config.input_dir.display(), "No videos found");
        }

        let summary = run_batch(pipeline, inputs, config.max_concurrent_videos).await;
        for failure in &summary.failed {
            warn!(video_id = %failure.video_id, "Failed: {}", failure.error);
        }
        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "All videos processed"
        );
    }

    info!("Worker shutdown complete");
    Ok(())
}
