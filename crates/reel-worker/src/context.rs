//! Request-scoped collaborator bundle for stage handlers.

use std::sync::Arc;

use reel_db::VideoStore;
use reel_media::MediaEngine;
use reel_queue::Enqueue;
use reel_storage::ObjectStore;

use crate::barrier::CompletionBarrier;
use crate::config::WorkerConfig;

/// Typed context injected into every handler invocation.
///
/// Handlers receive their collaborators explicitly; there is no ambient
/// lookup and no global mutable state. The only shared mutable state in
/// the whole pipeline is the video record's counter behind `store`.
#[derive(Clone)]
pub struct StageContext {
    /// Enqueue capability for follow-up messages
    pub queue: Arc<dyn Enqueue>,
    /// Object storage gateway
    pub storage: Arc<dyn ObjectStore>,
    /// Video record store
    pub store: Arc<dyn VideoStore>,
    /// External transcoding engine
    pub engine: Arc<dyn MediaEngine>,
    /// Worker configuration
    pub config: WorkerConfig,
}

impl StageContext {
    pub fn new(
        queue: Arc<dyn Enqueue>,
        storage: Arc<dyn ObjectStore>,
        store: Arc<dyn VideoStore>,
        engine: Arc<dyn MediaEngine>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            storage,
            store,
            engine,
            config,
        }
    }

    /// The completion barrier for this pipeline's topology.
    pub fn barrier(&self) -> CompletionBarrier {
        CompletionBarrier::new(Arc::clone(&self.store), self.config.fan_in_threshold)
    }
}
