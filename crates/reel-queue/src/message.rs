//! Stage message types.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{QueueError, QueueResult};

/// One message on the pipeline queue.
///
/// Messages are immutable once enqueued; a handler may enqueue any number
/// of follow-up messages as a side effect. The stage tag doubles as the
/// wire discriminant, so an unknown tag fails deserialization and is
/// classified permanent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum StageMessage {
    /// Normalize the uploaded source and fan out the remaining stages.
    Ingest { owner: String, video: String },
    /// Extract a preview frame.
    Thumbnail { owner: String, video: String },
    /// Repackage into an HLS streaming package.
    Segment { owner: String, video: String },
    /// Report one stage completion to the barrier.
    ReportProgress { owner: String, video: String },
}

impl StageMessage {
    /// The stage tag as it appears on the wire.
    pub fn stage(&self) -> &'static str {
        match self {
            StageMessage::Ingest { .. } => "ingest",
            StageMessage::Thumbnail { .. } => "thumbnail",
            StageMessage::Segment { .. } => "segment",
            StageMessage::ReportProgress { .. } => "report-progress",
        }
    }

    pub fn owner(&self) -> &str {
        match self {
            StageMessage::Ingest { owner, .. }
            | StageMessage::Thumbnail { owner, .. }
            | StageMessage::Segment { owner, .. }
            | StageMessage::ReportProgress { owner, .. } => owner,
        }
    }

    pub fn video(&self) -> &str {
        match self {
            StageMessage::Ingest { video, .. }
            | StageMessage::Thumbnail { video, .. }
            | StageMessage::Segment { video, .. }
            | StageMessage::ReportProgress { video, .. } => video,
        }
    }

    /// Encode for the wire.
    pub fn encode(&self) -> QueueResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the wire. Failures are permanent.
    pub fn decode(payload: &str) -> QueueResult<Self> {
        serde_json::from_str(payload).map_err(|e| QueueError::malformed(e.to_string()))
    }
}

/// The enqueue capability handed to stage handlers.
///
/// Handlers only ever add messages; consumption, retry, and concurrency
/// limiting stay with the queue implementation.
#[async_trait]
pub trait Enqueue: Send + Sync {
    /// Enqueue a message, returning its queue-assigned id.
    async fn enqueue(&self, message: StageMessage) -> QueueResult<String>;
}

/// Recording queue used in tests and local development.
#[derive(Default)]
pub struct MemoryQueue {
    messages: Mutex<Vec<StageMessage>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages enqueued so far, oldest first.
    pub fn messages(&self) -> Vec<StageMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Remove and return all enqueued messages.
    pub fn drain(&self) -> Vec<StageMessage> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }
}

#[async_trait]
impl Enqueue for MemoryQueue {
    async fn enqueue(&self, message: StageMessage) -> QueueResult<String> {
        let mut messages = self.messages.lock().unwrap();
        messages.push(message);
        Ok(format!("mem-{}", messages.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_tags_match_wire_format() {
        let msg = StageMessage::ReportProgress {
            owner: "u1".to_string(),
            video: "v1".to_string(),
        };
        let json = msg.encode().unwrap();
        assert!(json.contains(r#""stage":"report-progress""#));
        assert_eq!(StageMessage::decode(&json).unwrap(), msg);
    }

    #[test]
    fn unknown_stage_tag_is_malformed() {
        let err =
            StageMessage::decode(r#"{"stage":"transmogrify","owner":"u1","video":"v1"}"#)
                .unwrap_err();
        assert!(matches!(err, QueueError::Malformed(_)));
    }

    #[test]
    fn missing_payload_field_is_malformed() {
        let err = StageMessage::decode(r#"{"stage":"ingest","owner":"u1"}"#).unwrap_err();
        assert!(matches!(err, QueueError::Malformed(_)));
    }

    #[test]
    fn unparsable_body_is_malformed() {
        assert!(matches!(
            StageMessage::decode("not json").unwrap_err(),
            QueueError::Malformed(_)
        ));
    }
}
