//! Request Gateway crate for the Nexus client.
//!
//! This crate wraps the two operations the RAG backend exposes, `query` and
//! `ingest`, behind the [`RagGateway`] trait so controllers can be driven by
//! either the HTTP implementation or a scripted mock.
//!
//! # Example
//! ```no_run
//! use nexus_gateway::{HttpGateway, QueryRequest, RagGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = HttpGateway::with_base_url("http://localhost:8000");
//! let result = gateway.query(&QueryRequest::new("Who works at xAI?")).await?;
//! println!("{}", result.answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::RagGateway;
pub use error::{GatewayError, GatewayResult};
pub use factory::create_gateway;
pub use providers::{HttpGateway, MockGateway};
pub use types::{Citation, CitationMetadata, IngestResult, QueryRequest, QueryResult, SNIPPET_CHARS};
