use std::sync::Arc;

use tokio::sync::Mutex;

use crate::agents::history::{ConversationHistory, Turn};
use crate::data::ZoneMeta;
use crate::llm::LlmProvider;
use crate::rag::{ContextOutcome, RetrievalEngine};

/// Fixed user-facing message when the generation service cannot be reached.
/// Raw transport errors never reach the end user.
pub const SERVICE_APOLOGY: &str =
    "I'm having trouble connecting to my knowledge base. Please try again later.";

/// Outcome of an `ask` call.
///
/// `ServiceUnavailable` still carries the apology text handed to the user,
/// so callers can distinguish a degraded answer from a real one without
/// string matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answered(String),
    ServiceUnavailable(String),
}

impl AnswerOutcome {
    pub fn text(&self) -> &str {
        match self {
            AnswerOutcome::Answered(text) => text,
            AnswerOutcome::ServiceUnavailable(text) => text,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, AnswerOutcome::Answered(_))
    }
}

/// Specialized responder for one monitored zone.
///
/// Owns the zone persona and the conversational history. History access is
/// serialized through the responder's own lock; the lock is held across the
/// generation call so the open/seal sequence never interleaves. No index
/// lock is taken here — the retrieval engine is read-only after build.
pub struct Responder {
    zone: String,
    description: String,
    model: String,
    retrieval: Arc<RetrievalEngine>,
    llm: Arc<dyn LlmProvider>,
    history: Mutex<ConversationHistory>,
}

impl Responder {
    pub fn new(
        meta: ZoneMeta,
        retrieval: Arc<RetrievalEngine>,
        llm: Arc<dyn LlmProvider>,
        model: String,
    ) -> Self {
        Self {
            zone: meta.name,
            description: meta.description,
            model,
            retrieval,
            llm,
            history: Mutex::new(ConversationHistory::new()),
        }
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Answer a question grounded in this zone's retrieved context.
    ///
    /// The turn is opened before generation and sealed afterwards in every
    /// path, so the last history entry always carries a non-null answer once
    /// `ask` returns.
    pub async fn ask(&self, question: &str) -> AnswerOutcome {
        let mut history = self.history.lock().await;
        let turn = history.open_turn(question);

        let context = match self
            .retrieval
            .context_for_query(question, Some(&self.zone))
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(zone = %self.zone, "Context retrieval failed: {}", err);
                ContextOutcome::NotFound
            }
        };

        let prompt = self.build_prompt(question, &context, &history.render_recent());
        tracing::debug!(zone = %self.zone, prompt_len = prompt.len(), "Assembled grounding payload");

        match self.llm.generate(&prompt, &self.model).await {
            Ok(answer) => {
                history.seal_turn(turn, answer.clone());
                AnswerOutcome::Answered(answer)
            }
            Err(err) => {
                tracing::warn!(zone = %self.zone, "Generation failed: {}", err);
                history.seal_turn(turn, SERVICE_APOLOGY.to_string());
                AnswerOutcome::ServiceUnavailable(SERVICE_APOLOGY.to_string())
            }
        }
    }

    /// Copy of the full turn log, for inspection by the presentation layer.
    pub async fn history_snapshot(&self) -> Vec<Turn> {
        self.history.lock().await.turns().to_vec()
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are an expert on the {zone} monitored zone.\n\
             {description}\n\
             Answer questions about the {zone} environment and its data.\n\
             IMPORTANT: Always use the actual data provided in the context to answer questions. \
             Never make up or guess values.\n\
             If the data is not available in the context, say \"I don't have enough data to \
             answer that question\" rather than making assumptions.\n\
             Be precise and scientific in your responses.",
            zone = self.zone,
            description = self.description,
        )
    }

    /// Fixed payload order: persona, instructions, retrieved context,
    /// recent history, then the new question.
    fn build_prompt(&self, question: &str, context: &ContextOutcome, history: &str) -> String {
        format!(
            "{system}\n\nRelevant Data:\n{context}\n\nConversation History:\n{history}\n\nUser: {question}\nAssistant:",
            system = self.system_prompt(),
            context = context.as_text(),
            history = history,
            question = question,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ApiError;
    use crate::data::{
        ColumnSummary, StatValue, StaticZoneSource, VariableConfig, VariableStats, ZoneConfig,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Provider with a switchable failure mode and a captured prompt.
    struct ScriptedProvider {
        fail: AtomicBool,
        last_prompt: StdMutex<Option<String>>,
    }

    impl ScriptedProvider {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                last_prompt: StdMutex::new(None),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(!self.fail.load(Ordering::SeqCst))
        }

        async fn generate(&self, prompt: &str, _model_id: &str) -> Result<String, ApiError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::ServiceUnavailable);
            }
            Ok("The mean temperature is 30.00 degrees.".to_string())
        }

        async fn embed(
            &self,
            inputs: &[String],
            _model_id: &str,
        ) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs
                .iter()
                .map(|text| {
                    if text.to_lowercase().contains("temperature") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    fn desert_responder(provider: Arc<ScriptedProvider>) -> Responder {
        let source = StaticZoneSource::new(vec![ZoneConfig {
            name: "Desert".to_string(),
            description: "A hot, arid environment.".to_string(),
            timeframe: None,
            variables: vec![VariableConfig {
                name: "Temperature".to_string(),
                columns: vec![ColumnSummary {
                    column: "temp_c".to_string(),
                    stats: VariableStats {
                        mean: StatValue::Scalar(30.0),
                        min: StatValue::Scalar(20.0),
                        max: StatValue::Scalar(40.0),
                        std: StatValue::Scalar(5.0),
                    },
                }],
            }],
        }]);
        let retrieval = Arc::new(RetrievalEngine::new(
            Arc::new(source),
            provider.clone(),
            "stub-embed".to_string(),
        ));
        Responder::new(
            ZoneMeta {
                name: "Desert".to_string(),
                description: "A hot, arid environment.".to_string(),
            },
            retrieval,
            provider,
            "stub-model".to_string(),
        )
    }

    #[tokio::test]
    async fn ask_seals_history_with_answer() {
        let provider = Arc::new(ScriptedProvider::new());
        let responder = desert_responder(provider);

        let outcome = responder.ask("What is the temperature?").await;
        assert!(outcome.is_answered());

        let history = responder.history_snapshot().await;
        let last = history.last().expect("turn recorded");
        assert_eq!(last.question, "What is the temperature?");
        assert_eq!(last.answer.as_deref(), Some(outcome.text()));
    }

    #[tokio::test]
    async fn ask_seals_history_with_apology_on_failure() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.fail.store(true, Ordering::SeqCst);
        let responder = desert_responder(provider);

        let outcome = responder.ask("What is the temperature?").await;
        assert_eq!(
            outcome,
            AnswerOutcome::ServiceUnavailable(SERVICE_APOLOGY.to_string())
        );

        let history = responder.history_snapshot().await;
        let last = history.last().expect("turn recorded");
        assert_eq!(last.answer.as_deref(), Some(SERVICE_APOLOGY));
    }

    #[tokio::test]
    async fn prompt_carries_persona_context_and_question() {
        let provider = Arc::new(ScriptedProvider::new());
        let responder = desert_responder(provider.clone());

        responder.ask("What is the temperature like?").await;

        let prompt = provider
            .last_prompt
            .lock()
            .unwrap()
            .clone()
            .expect("prompt captured");
        assert!(prompt.contains("expert on the Desert monitored zone"));
        assert!(prompt.contains("Relevant Data:"));
        assert!(prompt.contains("Variable: Temperature (temp_c) in Desert."));
        assert!(prompt.contains("Conversation History:"));
        assert!(prompt.ends_with("User: What is the temperature like?\nAssistant:"));
    }

    #[tokio::test]
    async fn follow_up_prompt_includes_previous_turn() {
        let provider = Arc::new(ScriptedProvider::new());
        let responder = desert_responder(provider.clone());

        responder.ask("What is the temperature?").await;
        responder.ask("And the standard deviation?").await;

        let prompt = provider
            .last_prompt
            .lock()
            .unwrap()
            .clone()
            .expect("prompt captured");
        assert!(prompt.contains("User: What is the temperature?"));
        assert!(prompt.contains("Assistant: The mean temperature is 30.00 degrees."));
    }
}
