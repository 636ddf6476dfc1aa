use std::sync::Arc;

use datasearch_backend::config::AppConfig;
use datasearch_backend::ingest::IngestPipeline;
use datasearch_backend::mutation::MutationService;
use datasearch_backend::search::SearchEngine;
use datasearch_backend::store::RecordStore;

/// Shared handles, built once in `main` / 应用状态
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub search: SearchEngine,
    pub ingest: IngestPipeline,
    pub mutation: MutationService,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<RecordStore>, config: AppConfig) -> Self {
        Self {
            search: SearchEngine::new(store.clone(), &config.search),
            ingest: IngestPipeline::new(store.clone()),
            mutation: MutationService::new(store.clone()),
            store,
            config,
        }
    }
}
