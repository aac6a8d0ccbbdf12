//! Scripted gateway for tests and offline runs.

use crate::client::RagGateway;
use crate::error::{GatewayError, GatewayResult};
use crate::types::{IngestResult, QueryRequest, QueryResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

/// Mock gateway that replays scripted outcomes in order.
///
/// Every call is counted the moment it is issued. When built with
/// [`MockGateway::held`], calls then stay suspended until the test releases
/// them, which makes in-flight states observable. An exhausted script
/// answers with a transport failure.
#[derive(Debug, Default)]
pub struct MockGateway {
    query_script: Mutex<VecDeque<GatewayResult<QueryResult>>>,
    ingest_script: Mutex<VecDeque<GatewayResult<IngestResult>>>,
    queries: Mutex<Vec<QueryRequest>>,
    query_calls: AtomicUsize,
    ingest_calls: AtomicUsize,
    gate: Option<Semaphore>,
}

impl MockGateway {
    /// Create a mock whose calls complete immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose calls wait for [`MockGateway::release`].
    pub fn held() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    /// Queue the outcome of the next unscripted `query` call.
    pub fn push_query(&self, outcome: GatewayResult<QueryResult>) -> &Self {
        lock(&self.query_script).push_back(outcome);
        self
    }

    /// Queue the outcome of the next unscripted `ingest` call.
    pub fn push_ingest(&self, outcome: GatewayResult<IngestResult>) -> &Self {
        lock(&self.ingest_script).push_back(outcome);
        self
    }

    /// Let `count` held calls proceed.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Number of `query` calls issued so far.
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Number of `ingest` calls issued so far.
    pub fn ingest_calls(&self) -> usize {
        self.ingest_calls.load(Ordering::SeqCst)
    }

    /// Requests received by `query`, in call order.
    pub fn queries(&self) -> Vec<QueryRequest> {
        lock(&self.queries).clone()
    }

    async fn wait_for_release(&self) {
        if let Some(gate) = &self.gate {
            // The semaphore is never closed, so acquire only fails on a bug.
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn exhausted(operation: &str) -> GatewayError {
    GatewayError::Transport(format!("mock gateway has no scripted {} response", operation))
}

#[async_trait::async_trait]
impl RagGateway for MockGateway {
    fn endpoint(&self) -> &str {
        "mock://"
    }

    async fn query(&self, request: &QueryRequest) -> GatewayResult<QueryResult> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.queries).push(request.clone());

        self.wait_for_release().await;

        let next = lock(&self.query_script).pop_front();
        next.unwrap_or_else(|| Err(exhausted("query")))
    }

    async fn ingest(&self) -> GatewayResult<IngestResult> {
        self.ingest_calls.fetch_add(1, Ordering::SeqCst);

        self.wait_for_release().await;

        let next = lock(&self.ingest_script).pop_front();
        next.unwrap_or_else(|| Err(exhausted("ingest")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Citation;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_replays_script_in_order() {
        let mock = MockGateway::new();
        mock.push_query(Ok(QueryResult {
            answer: "first".to_string(),
            sources: vec![Citation::new("C", "bob")],
        }))
        .push_query(Err(GatewayError::Transport("down".to_string())));

        let first = mock.query(&QueryRequest::new("one")).await.unwrap();
        assert_eq!(first.answer, "first");

        let second = mock.query(&QueryRequest::new("two")).await;
        assert!(second.is_err());

        assert_eq!(mock.query_calls(), 2);
        assert_eq!(mock.queries()[1].query, "two");
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let mock = MockGateway::new();
        let err = mock.ingest().await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
        assert_eq!(mock.ingest_calls(), 1);
    }

    #[tokio::test]
    async fn test_held_call_waits_for_release() {
        let mock = Arc::new(MockGateway::held());
        mock.push_ingest(Ok(IngestResult {
            message: "Done".to_string(),
            profiles_ingested: 1,
            edges_ingested: None,
        }));

        let task = {
            let mock = Arc::clone(&mock);
            tokio::spawn(async move { mock.ingest().await })
        };

        while mock.ingest_calls() == 0 {
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        mock.release(1);
        let result = task.await.unwrap().unwrap();
        assert_eq!(result.message, "Done");
    }
}
