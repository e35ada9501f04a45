use crate::{services::FeedPipeline, store::PersistenceBridge};

/// Shared application state
///
/// Everything handlers touch sits behind a trait object or a clone-cheap
/// handle, so tests can assemble a state around mock providers and stores.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: FeedPipeline,
    pub bridge: PersistenceBridge,
}

impl AppState {
    pub fn new(pipeline: FeedPipeline, bridge: PersistenceBridge) -> Self {
        Self { pipeline, bridge }
    }
}
