use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::agents::{Responder, ZoneRegistry, ZoneRouter};
use crate::core::config::{AppPaths, Settings};
use crate::data::{StaticZoneSource, ZoneSource};
use crate::llm::{LlmProvider, OllamaProvider};
use crate::rag::RetrievalEngine;

pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub llm: Arc<dyn LlmProvider>,
    pub retrieval: Arc<RetrievalEngine>,
    pub registry: Arc<ZoneRegistry>,
    pub router: ZoneRouter,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::load(&paths.config_path())?;

        let llm: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::new(
            settings.llm.base_url.clone(),
            settings.llm.timeout_secs,
        ));
        let source = Arc::new(StaticZoneSource::new(settings.zones.clone()));
        let retrieval = Arc::new(RetrievalEngine::new(
            source.clone(),
            llm.clone(),
            settings.llm.embedding_model.clone(),
        ));

        // Registration order follows the config file; the keyword scan and
        // vote tie-breaks depend on it.
        let responders: Vec<Arc<Responder>> = source
            .zones()
            .into_iter()
            .map(|meta| {
                Arc::new(Responder::new(
                    meta,
                    retrieval.clone(),
                    llm.clone(),
                    settings.llm.model.clone(),
                ))
            })
            .collect();
        let registry = Arc::new(ZoneRegistry::new(responders));
        let router = ZoneRouter::new(
            registry.clone(),
            retrieval.clone(),
            llm.clone(),
            settings.llm.model.clone(),
        );

        Ok(Arc::new(AppState {
            paths,
            settings,
            llm,
            retrieval,
            registry,
            router,
            started_at: Utc::now(),
        }))
    }
}
