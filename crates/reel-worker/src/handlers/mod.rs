//! Stage handlers and the pipeline router.
//!
//! Handlers are stateless between invocations; all state lives in the
//! video record and the ephemeral workspace. Each handler composes the
//! workspace, the media engine, the storage gateway and the queue, and is
//! safe to re-run from scratch after a mid-flight failure.

mod ingest;
mod report;
mod segment;
mod thumbnail;

pub use ingest::handle_ingest;
pub use report::handle_report;
pub use segment::handle_segment;
pub use thumbnail::handle_thumbnail;

use std::time::Instant;

use reel_queue::StageMessage;
use tracing::info;

use crate::context::StageContext;
use crate::error::StageResult;

/// Route a message to its stage handler.
///
/// Unknown stage tags never reach this point: they fail message decoding
/// in the queue and are classified permanent there.
pub async fn dispatch(ctx: &StageContext, message: &StageMessage) -> StageResult<()> {
    let stage = message.stage();
    let owner = message.owner();
    let video = message.video();
    let start = Instant::now();
    info!(stage, owner, video, "Stage started");

    let result = match message {
        StageMessage::Ingest { owner, video } => handle_ingest(ctx, owner, video).await,
        StageMessage::Thumbnail { owner, video } => handle_thumbnail(ctx, owner, video).await,
        StageMessage::Segment { owner, video } => handle_segment(ctx, owner, video).await,
        StageMessage::ReportProgress { owner, video } => handle_report(ctx, owner, video).await,
    };

    if result.is_ok() {
        info!(stage, owner, video, elapsed = ?start.elapsed(), "Stage finished");
    }
    result
}
