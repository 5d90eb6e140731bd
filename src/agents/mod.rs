//! Responder sessions and zone routing.
//!
//! This module provides:
//! - `ConversationHistory`: two-phase (open, seal) per-responder turn log
//! - `Responder`: per-zone persona that assembles the grounding payload
//! - `ZoneRegistry` / `ZoneRouter`: decides which responder answers a query

mod history;
mod responder;
mod router;

pub use history::{ConversationHistory, Turn, PROMPT_WINDOW};
pub use responder::{AnswerOutcome, Responder, SERVICE_APOLOGY};
pub use router::{ZoneRegistry, ZoneRouter};
