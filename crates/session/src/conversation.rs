//! Conversation controller.
//!
//! State machine:
//! - `Idle --submit(text)--> AwaitingResponse` when `text` is not blank
//! - `AwaitingResponse --answer--> Idle`, appending an answer turn
//! - `AwaitingResponse --failure--> Idle`, appending a failure turn
//!
//! The user turn is appended before the backend is called, so it is visible
//! for the whole time the request is outstanding.

use crate::busy::BusyFlag;
use crate::call::InFlight;
use crate::transcript::Transcript;
use crate::turn::{FailureReason, Turn};
use nexus_core::config::{AppConfig, DEFAULT_TIMEOUT_SECS};
use nexus_gateway::{QueryRequest, RagGateway};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Retrieval options sent with every query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub top_k: Option<u32>,
    pub use_graph_ranking: Option<bool>,
}

impl QueryOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.top_k,
            use_graph_ranking: config.use_graph_ranking,
        }
    }

    fn request(&self, text: &str) -> QueryRequest {
        let mut request = QueryRequest::new(text);
        if let Some(top_k) = self.top_k {
            request = request.with_top_k(top_k);
        }
        if let Some(enabled) = self.use_graph_ranking {
            request = request.with_graph_ranking(enabled);
        }
        request
    }
}

/// Observable state of the conversation controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    AwaitingResponse,
}

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Input was empty or whitespace only
    EmptyInput,

    /// Another query is still in flight
    Busy,
}

/// Result of [`ConversationController::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was appended and no request was sent
    Rejected(RejectReason),

    /// The request finished; carries the assistant turn that was appended
    Completed(Turn),
}

/// Owns the transcript and sequences queries against the backend.
pub struct ConversationController {
    gateway: Arc<dyn RagGateway>,
    options: QueryOptions,
    timeout: Duration,
    transcript: Transcript,
    querying: BusyFlag,
    draft: Mutex<String>,
    in_flight: InFlight,
}

impl ConversationController {
    pub fn new(gateway: Arc<dyn RagGateway>, options: QueryOptions) -> Self {
        Self {
            gateway,
            options,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            transcript: Transcript::new(),
            querying: BusyFlag::new(),
            draft: Mutex::new(String::new()),
            in_flight: InFlight::new(CancellationToken::new()),
        }
    }

    /// Set the deadline for each query.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tie in-flight queries to an outer cancellation token (e.g. shutdown).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.in_flight = InFlight::new(token);
        self
    }

    /// Submit a question.
    ///
    /// Blank input and submissions while a query is in flight are rejected
    /// without touching the transcript or the backend. Otherwise the user
    /// turn is appended, the draft cleared, and the backend queried once.
    /// Failures become a failure turn; this method never errors.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring blank submission");
            return SubmitOutcome::Rejected(RejectReason::EmptyInput);
        }

        let Some(busy) = self.querying.try_acquire() else {
            tracing::debug!("Ignoring submission while a query is in flight");
            return SubmitOutcome::Rejected(RejectReason::Busy);
        };

        self.transcript.append(Turn::user(text));
        self.clear_draft();

        let request = self.options.request(text);
        tracing::debug!("Query state: AwaitingResponse");

        let call = self.in_flight.begin();
        let outcome = call
            .run(self.timeout, self.gateway.query(&request))
            .await;
        drop(call);

        let turn = match outcome {
            Ok(result) => {
                tracing::info!("Answer received with {} sources", result.sources.len());
                Turn::answer(result.answer, result.sources)
            }
            Err(err) => {
                tracing::warn!("Query failed: {}", err);
                Turn::failed(FailureReason::from(&err))
            }
        };

        self.transcript.append(turn.clone());
        drop(busy);
        tracing::debug!("Query state: Idle");

        SubmitOutcome::Completed(turn)
    }

    /// Submit the current draft.
    pub async fn submit_draft(&self) -> SubmitOutcome {
        let text = self.draft();
        self.submit(&text).await
    }

    /// Cancel the query in flight. Returns false if there was none.
    pub fn cancel(&self) -> bool {
        let cancelled = self.in_flight.cancel();
        if cancelled {
            tracing::info!("Cancelling in-flight query");
        }
        cancelled
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft_slot() = text.into();
    }

    pub fn draft(&self) -> String {
        self.draft_slot().clone()
    }

    /// Whether a submit of the current draft would be accepted.
    pub fn can_submit(&self) -> bool {
        !self.is_querying() && !self.draft_slot().trim().is_empty()
    }

    pub fn is_querying(&self) -> bool {
        self.querying.is_set()
    }

    pub fn state(&self) -> ConversationState {
        if self.is_querying() {
            ConversationState::AwaitingResponse
        } else {
            ConversationState::Idle
        }
    }

    /// Follow the `querying` flag.
    pub fn watch_querying(&self) -> watch::Receiver<bool> {
        self.querying.subscribe()
    }

    /// Read-only view of the transcript.
    pub fn transcript(&self) -> Vec<Turn> {
        self.transcript.all()
    }

    /// Follow transcript appends.
    pub fn watch_transcript(&self) -> watch::Receiver<Vec<Turn>> {
        self.transcript.subscribe()
    }

    fn clear_draft(&self) {
        self.draft_slot().clear();
    }

    fn draft_slot(&self) -> std::sync::MutexGuard<'_, String> {
        self.draft
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_send_bare_query() {
        let request = QueryOptions::default().request("hello");
        assert_eq!(request, QueryRequest::new("hello"));
    }

    #[test]
    fn test_options_from_config() {
        let mut config = AppConfig::default();
        config.top_k = Some(4);
        config.use_graph_ranking = Some(false);

        let request = QueryOptions::from_config(&config).request("hello");
        assert_eq!(request.top_k, Some(4));
        assert_eq!(request.use_graph_ranking, Some(false));
    }
}
