//! Request Gateway abstraction.
//!
//! The gateway is the only component that talks to the RAG backend. It
//! serializes requests, deserializes responses and turns every kind of
//! transport trouble into a single typed failure.

use crate::error::GatewayResult;
use crate::types::{IngestResult, QueryRequest, QueryResult};

/// Trait for RAG backends.
///
/// Implementations perform exactly one outbound call per invocation. They do
/// not retry, cache or deduplicate, and never return partial results.
#[async_trait::async_trait]
pub trait RagGateway: Send + Sync {
    /// Base endpoint the gateway talks to, for diagnostics.
    fn endpoint(&self) -> &str;

    /// Ask the backend a question.
    ///
    /// The caller is responsible for rejecting blank queries.
    async fn query(&self, request: &QueryRequest) -> GatewayResult<QueryResult>;

    /// Rebuild the backend's knowledge base from its profile store.
    async fn ingest(&self) -> GatewayResult<IngestResult>;
}
