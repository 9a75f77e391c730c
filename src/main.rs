use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gallery_thumbnailer::{PipelineConfig, ProgressEvent, ThumbnailPipeline, discover};

#[derive(Parser, Debug)]
#[command(version, about = "Generate gallery thumbnails for photo/video directories")]
struct Args {
    /// JSON config file; flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source media directory (repeatable).
    #[arg(short, long = "source")]
    sources: Vec<PathBuf>,

    /// Root of the mirrored thumbnail tree.
    #[arg(short, long)]
    thumbnail_root: Option<PathBuf>,

    /// Entries processed concurrently per directory.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Treat each source as a tree and process every directory in it
    /// that contains media.
    #[arg(short, long)]
    recursive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path).await?,
        None => PipelineConfig::default(),
    };
    if !args.sources.is_empty() {
        config.source_dirs = args.sources;
    }
    if let Some(root) = args.thumbnail_root {
        config.thumbnail_root = root;
    }
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if config.source_dirs.is_empty() {
        return Err(eyre!("no source directories configured"));
    }
    if args.recursive {
        let discovered: Vec<PathBuf> = config
            .source_dirs
            .iter()
            .flat_map(|root| discover(root, &config))
            .collect();
        config.source_dirs = discovered;
        info!(
            directories = config.source_dirs.len(),
            "discovered media directories"
        );
    }

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing in-flight entries");
                token.cancel();
            }
        });
    }

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();
    let reporter = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            match event.failure {
                None => info!(
                    "[{}/{}] {}",
                    event.completed,
                    event.total,
                    event.source_path.display()
                ),
                Some(detail) => warn!(
                    "[{}/{}] {} failed: {detail}",
                    event.completed,
                    event.total,
                    event.source_path.display()
                ),
            }
        }
    });

    let pipeline = ThumbnailPipeline::new(config)
        .with_progress(progress_tx)
        .with_cancellation(token);
    let runs = pipeline.run_all().await;
    drop(pipeline);
    reporter.await?;

    let mut generated = 0usize;
    let mut failed_entries = 0usize;
    let mut fatal = 0usize;
    for run in &runs {
        match &run.result {
            Ok(outcomes) => {
                generated += outcomes.iter().filter(|o| o.is_success()).count();
                failed_entries += outcomes.iter().filter(|o| !o.is_success()).count();
            }
            Err(_) => fatal += 1,
        }
    }
    info!(
        directories = runs.len(),
        generated, failed_entries, fatal, "run complete"
    );

    if !runs.is_empty() && fatal == runs.len() {
        return Err(eyre!(
            "every configured directory failed before dispatching"
        ));
    }
    Ok(())
}
