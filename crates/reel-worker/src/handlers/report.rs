//! Report-progress stage: the aggregation end of the completion barrier.

use reel_models::{keys, ProcessingState};
use tracing::{debug, info};

use crate::context::StageContext;
use crate::error::StageResult;

/// Record one stage completion; the invocation that observes the fan-in
/// threshold deletes the upstream source object.
///
/// Only this stage may delete the source. A duplicate delivery increments
/// the counter past the threshold and does nothing else; a concurrent
/// delete that already happened surfaces as a tolerated no-op.
pub async fn handle_report(ctx: &StageContext, owner: &str, video: &str) -> StageResult<()> {
    let barrier = ctx.barrier();
    let count = barrier.report(owner, video).await?;
    let state = ProcessingState::from_count(count, barrier.threshold());

    if barrier.should_finalize(count) {
        let source_key = keys::source_key(owner, video);
        let deleted = ctx.storage.delete(&source_key).await?;
        if deleted {
            info!(owner, video, count, "All stages reported, upstream source deleted");
        } else {
            // Duplicate delivery raced us past the threshold
            debug!(owner, video, count, "Upstream source already deleted");
        }
    } else {
        debug!(owner, video, count, %state, "Completion recorded");
    }

    Ok(())
}
