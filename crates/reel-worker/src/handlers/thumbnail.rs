//! Thumbnail stage: extract one preview frame.

use reel_models::keys;
use reel_queue::StageMessage;
use tracing::info;

use crate::context::StageContext;
use crate::error::StageResult;
use crate::workspace::JobWorkspace;

/// Download the source, extract a preview frame, upload it under the
/// thumbnail artifact key and report completion.
pub async fn handle_thumbnail(ctx: &StageContext, owner: &str, video: &str) -> StageResult<()> {
    let workspace = JobWorkspace::acquire(&ctx.config.work_dir, "thumbnail")
        .map_err(crate::error::StageError::Workspace)?;

    let input = workspace.file(format!("{}.mp4", video));
    ctx.storage
        .fetch_to_file(&keys::source_key(owner, video), &input)
        .await?;

    let frame = workspace.file("thumbnail.jpg");
    ctx.engine.extract_preview_frame(&input, &frame).await?;

    ctx.storage
        .put_file(&frame, &keys::thumbnail_key(owner, video), "image/jpeg")
        .await?;

    ctx.queue
        .enqueue(StageMessage::ReportProgress {
            owner: owner.to_string(),
            video: video.to_string(),
        })
        .await?;

    info!(owner, video, "Thumbnail uploaded");
    Ok(())
}
