use std::sync::Arc;

use crate::agents::responder::{AnswerOutcome, Responder, SERVICE_APOLOGY};
use crate::llm::LlmProvider;
use crate::rag::{ContextOutcome, RetrievalEngine};

/// Immutable-after-init mapping from zone name to responder.
///
/// Backed by an ordered list: registration order drives the keyword scan
/// and the documented tie-breaks, so it must be preserved.
pub struct ZoneRegistry {
    responders: Vec<Arc<Responder>>,
}

impl ZoneRegistry {
    pub fn new(responders: Vec<Arc<Responder>>) -> Self {
        Self { responders }
    }

    pub fn get(&self, zone: &str) -> Option<&Arc<Responder>> {
        self.responders.iter().find(|r| r.zone() == zone)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Responder>> {
        self.responders.iter()
    }

    pub fn zone_names(&self) -> Vec<&str> {
        self.responders.iter().map(|r| r.zone()).collect()
    }

    pub fn len(&self) -> usize {
        self.responders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }
}

/// Decides which responder answers a query.
pub struct ZoneRouter {
    registry: Arc<ZoneRegistry>,
    retrieval: Arc<RetrievalEngine>,
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl ZoneRouter {
    pub fn new(
        registry: Arc<ZoneRegistry>,
        retrieval: Arc<RetrievalEngine>,
        llm: Arc<dyn LlmProvider>,
        model: String,
    ) -> Self {
        Self {
            registry,
            retrieval,
            llm,
            model,
        }
    }

    /// Identify the zone a query is about, or `None`.
    ///
    /// Step 1: case-insensitive substring scan over registered zone names,
    /// first match in registry order wins — deliberately crude; a query
    /// naming two zones resolves to whichever is registered first.
    /// Step 2: top-2 retrieval majority vote over hit zone tags, ties broken
    /// by first occurrence in the hit list. Retrieval failures degrade to
    /// `None` rather than erroring.
    pub async fn identify_zone(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        for responder in self.registry.iter() {
            if lowered.contains(&responder.zone().to_lowercase()) {
                return Some(responder.zone().to_string());
            }
        }

        let hits = match self.retrieval.query(text, 2).await {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!("Zone vote retrieval failed: {}", err);
                return None;
            }
        };

        let zones: Vec<&str> = hits.iter().filter_map(|r| r.zone.as_deref()).collect();
        majority_zone(&zones).map(str::to_string)
    }

    /// Dispatch a query to the right responder.
    ///
    /// An explicitly supplied, registered zone short-circuits
    /// identification. Queries that resolve to no zone fall back to the
    /// generic cross-zone path: no persona zone, no conversational memory,
    /// unfiltered context.
    pub async fn route(&self, text: &str, zone: Option<&str>) -> AnswerOutcome {
        if let Some(zone) = zone {
            if let Some(responder) = self.registry.get(zone) {
                tracing::info!(zone = %zone, "Routing to explicitly requested zone");
                return responder.ask(text).await;
            }
        }

        if let Some(zone) = self.identify_zone(text).await {
            if let Some(responder) = self.registry.get(&zone) {
                tracing::info!(zone = %zone, "Routing to identified zone");
                return responder.ask(text).await;
            }
        }

        tracing::info!("No zone identified; using generic responder");
        self.general_answer(text).await
    }

    /// Cross-zone fallback: same retrieval step, unfiltered by zone, no
    /// history, generic facility persona.
    async fn general_answer(&self, text: &str) -> AnswerOutcome {
        let context = match self.retrieval.context_for_query(text, None).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!("Context retrieval failed: {}", err);
                ContextOutcome::NotFound
            }
        };

        let prompt = self.general_prompt(text, &context);
        match self.llm.generate(&prompt, &self.model).await {
            Ok(answer) => AnswerOutcome::Answered(answer),
            Err(err) => {
                tracing::warn!("Generation failed: {}", err);
                AnswerOutcome::ServiceUnavailable(SERVICE_APOLOGY.to_string())
            }
        }
    }

    fn general_prompt(&self, question: &str, context: &ContextOutcome) -> String {
        let zones = self.registry.zone_names().join(", ");
        format!(
            "You are an expert on an environmental monitoring facility.\n\
             It contains several monitored zones: {zones}.\n\
             Answer general questions about the facility and suggest which specific zone \
             might have more detailed information.\n\n\
             Relevant Data:\n{context}\n\nUser: {question}\nAssistant:",
            zones = zones,
            context = context.as_text(),
            question = question,
        )
    }
}

/// Most frequent zone in vote order; ties resolve to the zone whose first
/// occurrence comes earliest in the list. First-occurrence tie-breaking is
/// a documented compatibility choice, not load-bearing design.
fn majority_zone<'a>(zones: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for (position, &zone) in zones.iter().enumerate() {
        // Count each zone once, at its first occurrence.
        if zones[..position].contains(&zone) {
            continue;
        }
        let count = zones.iter().filter(|&&z| z == zone).count();
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((zone, count)),
        }
    }
    best.map(|(zone, _)| zone)
}
