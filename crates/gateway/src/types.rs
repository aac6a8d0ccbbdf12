//! Wire types exchanged with the RAG backend.
//!
//! Field names follow the backend's JSON exactly (`profiles_ingested`,
//! `top_k`, ...). Unknown fields in responses are ignored, which matters for
//! sources: the backend returns whole stored documents, embeddings included.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of leading characters of a citation shown to the user.
pub const SNIPPET_CHARS: usize = 100;

/// One retrieved passage backing an assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Full passage text
    pub content: String,

    /// Attribution for the passage
    #[serde(default)]
    pub metadata: CitationMetadata,

    /// Stored document id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Similarity score from vector search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Attribution metadata attached to a citation.
///
/// Documents added outside profile ingestion may carry no metadata at all,
/// so every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationMetadata {
    /// Handle of the profile the passage was built from, empty when unknown
    #[serde(default)]
    pub username: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Document kind (e.g. "profile")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Any other metadata keys, preserved untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Citation {
    /// Create a citation with only the required fields.
    pub fn new(content: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: CitationMetadata {
                username: username.into(),
                name: None,
                kind: None,
                extra: Map::new(),
            },
            id: None,
            score: None,
        }
    }

    /// Leading portion of the passage shown to the user.
    ///
    /// Counts characters, not bytes, so multi-byte text is never split.
    pub fn snippet(&self) -> &str {
        match self.content.char_indices().nth(SNIPPET_CHARS) {
            Some((idx, _)) => &self.content[..idx],
            None => &self.content,
        }
    }

    /// Whether `snippet()` drops part of the content.
    pub fn is_truncated(&self) -> bool {
        self.content.chars().nth(SNIPPET_CHARS).is_some()
    }
}

/// Body of `POST /api/rag/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's question
    pub query: String,

    /// Passages to retrieve; backend default applies when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Graph reranking toggle; backend default applies when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_graph_ranking: Option<bool>,
}

impl QueryRequest {
    /// Create a query request with backend defaults.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: None,
            use_graph_ranking: None,
        }
    }

    /// Set the number of passages to retrieve.
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Enable or disable graph reranking.
    pub fn with_graph_ranking(mut self, enabled: bool) -> Self {
        self.use_graph_ranking = Some(enabled);
        self
    }
}

/// Successful query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,

    /// Citations in backend (relevance) order
    pub sources: Vec<Citation>,
}

/// Successful ingestion response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResult {
    /// Human-readable summary
    pub message: String,

    pub profiles_ingested: u64,

    /// Graph edges loaded alongside the profiles, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges_ingested: Option<u64>,
}
