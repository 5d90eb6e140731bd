use chrono::{DateTime, Utc};
use serde::Serialize;

/// Turns included when rendering history into a prompt. The full history is
/// retained beyond this window for later inspection.
pub const PROMPT_WINDOW: usize = 5;

/// One question/answer exchange. The answer is absent while the turn is
/// open (question asked, generation pending).
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub question: String,
    pub answer: Option<String>,
    pub asked_at: DateTime<Utc>,
}

/// Ordered per-responder turn log with two-phase mutation: a turn is opened
/// before the answer exists and sealed in place once it arrives. Callers
/// must not interleave open/seal sequences for the same responder; the
/// owning responder serializes access behind its own lock.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pending turn and return its index for sealing.
    pub fn open_turn(&mut self, question: &str) -> usize {
        self.turns.push(Turn {
            question: question.to_string(),
            answer: None,
            asked_at: Utc::now(),
        });
        self.turns.len() - 1
    }

    /// Patch the answer into a previously opened turn.
    pub fn seal_turn(&mut self, index: usize, answer: String) {
        if let Some(turn) = self.turns.get_mut(index) {
            turn.answer = Some(answer);
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Render the last `PROMPT_WINDOW` turns as alternating "User:" /
    /// "Assistant:" lines. Open turns contribute only the "User:" line.
    pub fn render_recent(&self) -> String {
        if self.turns.is_empty() {
            return String::new();
        }

        let start = self.turns.len().saturating_sub(PROMPT_WINDOW);
        let mut lines = Vec::new();
        for turn in &self.turns[start..] {
            lines.push(format!("User: {}", turn.question));
            if let Some(answer) = &turn.answer {
                lines.push(format!("Assistant: {}", answer));
            }
        }
        lines.join("\n")
    }
}
