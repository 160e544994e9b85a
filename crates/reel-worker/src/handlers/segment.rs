//! Segment stage: repackage the source into an HLS streaming package.

use reel_models::keys;
use reel_queue::StageMessage;
use reel_storage::put_dir;
use tracing::info;

use crate::context::StageContext;
use crate::error::StageResult;
use crate::workspace::JobWorkspace;

/// Download the source, segment it, upload every produced file under
/// artifact-relative keys and report completion.
pub async fn handle_segment(ctx: &StageContext, owner: &str, video: &str) -> StageResult<()> {
    let workspace = JobWorkspace::acquire(&ctx.config.work_dir, "segment")
        .map_err(crate::error::StageError::Workspace)?;

    let input = workspace.file(format!("{}.mp4", video));
    ctx.storage
        .fetch_to_file(&keys::source_key(owner, video), &input)
        .await?;

    let hls_dir = workspace.file(keys::HLS_DIR);
    ctx.engine
        .segment(&input, &hls_dir, ctx.config.segment_seconds)
        .await?;

    let uploaded = put_dir(
        ctx.storage.as_ref(),
        &hls_dir,
        &keys::hls_prefix(owner, video),
    )
    .await?;

    ctx.queue
        .enqueue(StageMessage::ReportProgress {
            owner: owner.to_string(),
            video: video.to_string(),
        })
        .await?;

    info!(
        owner,
        video,
        files = uploaded.len(),
        "HLS package uploaded"
    );
    Ok(())
}
