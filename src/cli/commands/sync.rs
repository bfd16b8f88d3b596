//! The sync command.

use std::path::Path;
use tokio::runtime::Runtime;
use tracing::info;

use crate::acquire::{AcquisitionPipeline, Ffmpeg, YoutubeClient, YtDlp};
use crate::backend;
use crate::config::Config;
use crate::error::{Result, ResultExt};
use crate::recommend;
use crate::reconcile::{Orchestrator, SyncOptions, SyncReport};

/// Run one sync and print the report
pub fn cmd_sync(
    rt: &Runtime,
    config: &Config,
    tracks_file: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let report = rt.block_on(sync(config, tracks_file, dry_run))?;
    println!("{}", report);
    Ok(())
}

async fn sync(config: &Config, tracks_file: Option<&Path>, dry_run: bool) -> Result<SyncReport> {
    let system = config.detect_system()?;
    config.validate(system)?;
    info!("Syncing to {}", system);

    let source = recommend::from_config(config, tracks_file)?;
    let mut tracks = source
        .fetch_tracks()
        .await
        .with_context(format!("fetching recommendations from {}", source.label()))?;
    if tracks.is_empty() {
        tracing::warn!("{} returned no tracks", source.label());
    }

    let backend = backend::connect(config, system)
        .await
        .with_context(format!("connecting to {}", system))?;

    let pipeline = build_pipeline(config, dry_run)?;

    let today = chrono::Local::now().date_naive();
    let mut options = SyncOptions::from_config(config, today, source.label());
    options.dry_run = dry_run;

    let orchestrator = Orchestrator::new(backend.as_ref(), &pipeline, options);
    let report = orchestrator.run(&mut tracks).await?;
    info!("Run finished: {}", report.phase);
    Ok(report)
}

/// A dry run never searches, so it does not need a YouTube key
fn build_pipeline(config: &Config, dry_run: bool) -> Result<AcquisitionPipeline> {
    let youtube = &config.youtube;
    let search = if dry_run {
        YoutubeClient::unchecked(youtube.api_key.as_deref())?
    } else {
        YoutubeClient::new(youtube.api_key.as_deref())?
    };

    Ok(AcquisitionPipeline::new(
        Box::new(search),
        Box::new(YtDlp::new(&youtube.ytdlp_path)),
        Box::new(Ffmpeg::new(&youtube.ffmpeg_path)),
        &youtube.download_dir,
        youtube.filter_list.clone(),
    ))
}
