//! Video record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a video, derived from its owner and name.
///
/// Two uploads by different users of a video with the same name must never
/// collide, so the identifier always carries both parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Derive the identifier for an owner/name pair.
    pub fn derive(owner: &str, name: &str) -> Self {
        Self(format!("{}/{}", owner, name))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Semantic state of a video, derived from its completion counter.
///
/// The counter itself is the persisted truth; this mapping exists so the
/// threshold arithmetic lives in exactly one place instead of being
/// re-inferred wherever the counter is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    /// Record exists, no stage has reported yet
    Created,
    /// Some but not all stages have reported
    PartiallyProcessed,
    /// All stages have reported; upstream source is gone
    Finalized,
}

impl ProcessingState {
    /// Map a counter value to its semantic state for a given fan-in threshold.
    ///
    /// Counts past the threshold happen under at-least-once delivery and
    /// still mean finalized.
    pub fn from_count(count: i32, threshold: i32) -> Self {
        if count <= 0 {
            ProcessingState::Created
        } else if count < threshold {
            ProcessingState::PartiallyProcessed
        } else {
            ProcessingState::Finalized
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingState::Created => "created",
            ProcessingState::PartiallyProcessed => "partially_processed",
            ProcessingState::Finalized => "finalized",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted video record.
///
/// Mutated only through creation and the completion barrier's atomic
/// increment; the record outlives finalization as the canonical reference
/// to the derived artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Stable identifier (owner + name)
    pub id: VideoId,

    /// Owning user
    pub owner: String,

    /// Video name, unique per owner
    pub name: String,

    /// Completion counter: number of stage reports received.
    /// Non-negative and monotonically non-decreasing.
    pub status: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a fresh record with a zero counter.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let owner = owner.into();
        let name = name.into();
        let now = Utc::now();
        Self {
            id: VideoId::derive(&owner, &name),
            owner,
            name,
            status: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Semantic state for the given fan-in threshold.
    pub fn state(&self, threshold: i32) -> ProcessingState {
        ProcessingState::from_count(self.status, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_id_is_derived_from_owner_and_name() {
        let id = VideoId::derive("u1", "v1");
        assert_eq!(id.as_str(), "u1/v1");
        assert_ne!(VideoId::derive("u1", "v1"), VideoId::derive("u2", "v1"));
    }

    #[test]
    fn state_mapping_follows_threshold() {
        assert_eq!(ProcessingState::from_count(0, 3), ProcessingState::Created);
        assert_eq!(
            ProcessingState::from_count(1, 3),
            ProcessingState::PartiallyProcessed
        );
        assert_eq!(
            ProcessingState::from_count(2, 3),
            ProcessingState::PartiallyProcessed
        );
        assert_eq!(ProcessingState::from_count(3, 3), ProcessingState::Finalized);
        // Duplicate deliveries push the counter past the threshold
        assert_eq!(ProcessingState::from_count(5, 3), ProcessingState::Finalized);
    }

    #[test]
    fn record_serde_roundtrip() {
        let record = VideoRecord::new("u1", "v1");
        let json = serde_json::to_string(&record).expect("serialize record");
        let decoded: VideoRecord = serde_json::from_str(&json).expect("deserialize record");
        assert_eq!(decoded.id, record.id);
        assert_eq!(decoded.status, 0);
    }
}
