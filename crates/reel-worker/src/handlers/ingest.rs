//! Ingest stage: normalize the uploaded source and fan out the pipeline.

use reel_models::keys;
use reel_queue::StageMessage;
use tracing::info;

use crate::context::StageContext;
use crate::error::StageResult;
use crate::workspace::JobWorkspace;

/// Download the uploaded source, normalize it to MP4, re-upload it to the
/// same key, then enqueue the downstream stages plus this stage's own
/// completion report.
///
/// Safe to re-run from scratch: the upload replaces the same key, the
/// record upsert keeps an existing counter, and downstream stages tolerate
/// duplicate messages.
pub async fn handle_ingest(ctx: &StageContext, owner: &str, video: &str) -> StageResult<()> {
    let workspace = JobWorkspace::acquire(&ctx.config.work_dir, "ingest")
        .map_err(crate::error::StageError::Workspace)?;

    let source_key = keys::source_key(owner, video);
    let uploaded = workspace.file(format!("{}.upload", video));
    ctx.storage.fetch_to_file(&source_key, &uploaded).await?;

    let normalized = workspace.file(format!("{}.mp4", video));
    ctx.engine.normalize(&uploaded, &normalized).await?;

    ctx.storage
        .put_file(&normalized, &source_key, "video/mp4")
        .await?;

    // The record must exist before anyone can report against it.
    ctx.store.upsert(owner, video).await?;

    for message in [
        StageMessage::Thumbnail {
            owner: owner.to_string(),
            video: video.to_string(),
        },
        StageMessage::Segment {
            owner: owner.to_string(),
            video: video.to_string(),
        },
        StageMessage::ReportProgress {
            owner: owner.to_string(),
            video: video.to_string(),
        },
    ] {
        ctx.queue.enqueue(message).await?;
    }

    info!(owner, video, "Ingest complete, downstream stages enqueued");
    Ok(())
}
