use std::sync::Arc;

use crate::pipeline::MatchAnalyzer;
use crate::storage::StorageConfig;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<MatchAnalyzer>,
    /// Set when maps are served from the JSONL data lake
    pub storage: Option<Arc<StorageConfig>>,
    pub cors_origin: Option<String>,
}

impl AppState {
    pub fn new(analyzer: MatchAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            storage: None,
            cors_origin: None,
        }
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    pub fn with_cors_origin(mut self, origin: Option<String>) -> Self {
        self.cors_origin = origin;
        self
    }
}
