//! Ingestion controller.
//!
//! State machine: `Idle --trigger--> Ingesting --outcome--> Idle`. The outcome
//! is reported as a notification and never touches the transcript.

use crate::busy::BusyFlag;
use crate::call::InFlight;
use crate::turn::FailureReason;
use nexus_core::config::DEFAULT_TIMEOUT_SECS;
use nexus_gateway::{IngestResult, RagGateway};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Observable state of the ingestion controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionState {
    Idle,
    Ingesting,
}

/// Terminal message for one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestNotification {
    Completed {
        message: String,
        profiles_ingested: u64,
        edges_ingested: Option<u64>,
    },
    Failed {
        reason: FailureReason,
    },
}

impl From<IngestResult> for IngestNotification {
    fn from(result: IngestResult) -> Self {
        IngestNotification::Completed {
            message: result.message,
            profiles_ingested: result.profiles_ingested,
            edges_ingested: result.edges_ingested,
        }
    }
}

impl IngestNotification {
    pub fn is_success(&self) -> bool {
        matches!(self, IngestNotification::Completed { .. })
    }
}

impl fmt::Display for IngestNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestNotification::Completed {
                message,
                profiles_ingested,
                edges_ingested: Some(edges),
            } => write!(
                f,
                "Ingestion Complete: {} ({} profiles, {} edges)",
                message, profiles_ingested, edges
            ),
            IngestNotification::Completed {
                message,
                profiles_ingested,
                edges_ingested: None,
            } => write!(
                f,
                "Ingestion Complete: {} ({} profiles)",
                message, profiles_ingested
            ),
            IngestNotification::Failed { .. } => write!(f, "Failed to ingest profiles"),
        }
    }
}

/// Result of [`IngestionController::trigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// An ingestion was already running; no request was sent
    Rejected,

    /// The run finished, successfully or not
    Finished(IngestNotification),
}

/// Runs knowledge base syncs, one at a time.
pub struct IngestionController {
    gateway: Arc<dyn RagGateway>,
    timeout: Duration,
    ingesting: BusyFlag,
    in_flight: InFlight,
}

impl IngestionController {
    pub fn new(gateway: Arc<dyn RagGateway>) -> Self {
        Self {
            gateway,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ingesting: BusyFlag::new(),
            in_flight: InFlight::new(CancellationToken::new()),
        }
    }

    /// Set the deadline for each ingestion run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tie in-flight runs to an outer cancellation token (e.g. shutdown).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.in_flight = InFlight::new(token);
        self
    }

    /// Start an ingestion run unless one is already in flight.
    pub async fn trigger(&self) -> TriggerOutcome {
        let Some(busy) = self.ingesting.try_acquire() else {
            tracing::debug!("Ignoring ingest trigger while ingestion is in flight");
            return TriggerOutcome::Rejected;
        };

        tracing::info!("Starting knowledge base sync via {}", self.gateway.endpoint());

        let call = self.in_flight.begin();
        let outcome = call.run(self.timeout, self.gateway.ingest()).await;
        drop(call);

        let notification = match outcome {
            Ok(result) => IngestNotification::from(result),
            Err(err) => {
                tracing::warn!("Ingestion failed: {}", err);
                IngestNotification::Failed {
                    reason: FailureReason::from(&err),
                }
            }
        };

        drop(busy);
        TriggerOutcome::Finished(notification)
    }

    /// Cancel the run in flight. Returns false if there was none.
    pub fn cancel(&self) -> bool {
        self.in_flight.cancel()
    }

    pub fn is_ingesting(&self) -> bool {
        self.ingesting.is_set()
    }

    pub fn state(&self) -> IngestionState {
        if self.is_ingesting() {
            IngestionState::Ingesting
        } else {
            IngestionState::Idle
        }
    }

    /// Follow the `ingesting` flag.
    pub fn watch_ingesting(&self) -> watch::Receiver<bool> {
        self.ingesting.subscribe()
    }
}
