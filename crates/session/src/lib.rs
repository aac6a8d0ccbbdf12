//! Conversation session state for the Nexus client.
//!
//! This crate owns everything with state in the client:
//! - [`Transcript`]: the append-only log of turns the UI renders
//! - [`ConversationController`]: submits questions and records answers
//! - [`IngestionController`]: triggers knowledge base syncs
//!
//! Both controllers guard re-entry with their own busy flag and never block
//! each other. Backend failures are converted into transcript entries or
//! notifications at the controller boundary and are never returned as errors.

mod busy;
mod call;
pub mod conversation;
pub mod ingestion;
pub mod transcript;
pub mod turn;

pub use conversation::{
    ConversationController, ConversationState, QueryOptions, RejectReason, SubmitOutcome,
};
pub use ingestion::{IngestNotification, IngestionController, IngestionState, TriggerOutcome};
pub use transcript::Transcript;
pub use turn::{AssistantReply, FailureKind, FailureReason, Role, Turn, FALLBACK_MESSAGE};
