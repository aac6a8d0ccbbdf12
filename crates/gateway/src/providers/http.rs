//! HTTP gateway for the RAG backend.
//!
//! Endpoints:
//! - `POST {base}/api/rag/query` with `{ "query": ... }`
//! - `POST {base}/api/rag/ingest-profiles` with no body

use crate::client::RagGateway;
use crate::error::{GatewayError, GatewayResult};
use crate::types::{IngestResult, QueryRequest, QueryResult};
use nexus_core::config::DEFAULT_ENDPOINT;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const QUERY_PATH: &str = "/api/rag/query";
const INGEST_PATH: &str = "/api/rag/ingest-profiles";

/// Error body the backend sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP implementation of [`RagGateway`].
pub struct HttpGateway {
    /// Base URL without trailing slash
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpGateway {
    /// Create a gateway for the default local backend.
    ///
    /// Default URL: http://localhost:8000
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT)
    }

    /// Create a gateway for a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check the status and decode the body of a backend response.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Transport(format!(
                "backend returned {}: {}",
                status,
                describe_error_body(&error_text)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("Failed to parse backend response: {}", e)))
    }
}

impl Default for HttpGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// Prefer the backend's `detail` message over the raw body.
fn describe_error_body(text: &str) -> String {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if text.trim().is_empty() => "empty response body".to_string(),
        Err(_) => text.trim().to_string(),
    }
}

#[async_trait::async_trait]
impl RagGateway for HttpGateway {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn query(&self, request: &QueryRequest) -> GatewayResult<QueryResult> {
        tracing::info!("Sending query to RAG backend");
        tracing::debug!("Request: {:?}", request);

        let response = self
            .client
            .post(self.url(QUERY_PATH))
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("Failed to send query: {}", e)))?;

        let result: QueryResult = Self::decode(response).await?;

        tracing::info!("Received answer with {} sources", result.sources.len());
        Ok(result)
    }

    async fn ingest(&self) -> GatewayResult<IngestResult> {
        tracing::info!("Requesting knowledge base ingestion");

        let response = self
            .client
            .post(self.url(INGEST_PATH))
            .send()
            .await
            .map_err(|e| {
                GatewayError::Transport(format!("Failed to send ingest request: {}", e))
            })?;

        let result: IngestResult = Self::decode(response).await?;

        tracing::info!(
            profiles = result.profiles_ingested,
            edges = ?result.edges_ingested,
            "Ingestion finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Serve a single canned response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (format!("http://{}", addr), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_gateway_creation() {
        let gateway = HttpGateway::new();
        assert_eq!(gateway.endpoint(), "http://localhost:8000");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let gateway = HttpGateway::with_base_url("http://rag.local:9000/");
        assert_eq!(gateway.url(QUERY_PATH), "http://rag.local:9000/api/rag/query");
    }

    #[test]
    fn test_describe_error_body() {
        assert_eq!(
            describe_error_body(r#"{"detail": "No documents in knowledge base. Run /ingest-profiles first."}"#),
            "No documents in knowledge base. Run /ingest-profiles first."
        );
        assert_eq!(describe_error_body("Bad Gateway"), "Bad Gateway");
        assert_eq!(describe_error_body(""), "empty response body");
        assert!(describe_error_body(r#"{"detail": [{"loc": ["body", "query"]}]}"#).contains("loc"));
    }

    #[tokio::test]
    async fn test_query_success() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"answer": "A", "sources": [{"content": "C", "metadata": {"username": "bob"}}]}"#,
        )
        .await;

        let gateway = HttpGateway::with_base_url(base);
        let result = gateway
            .query(&QueryRequest::new("who is bob?").with_top_k(3))
            .await
            .unwrap();

        assert_eq!(result.answer, "A");
        assert_eq!(result.sources, vec![crate::types::Citation::new("C", "bob")]);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/rag/query HTTP/1.1"));
        assert!(request.contains(r#""query":"who is bob?""#));
        assert!(request.contains(r#""top_k":3"#));
        assert!(!request.contains("use_graph_ranking"));
    }

    #[tokio::test]
    async fn test_query_not_found_is_transport_failure() {
        let (base, _server) = serve_once(
            "404 Not Found",
            r#"{"detail": "No documents in knowledge base. Run /ingest-profiles first."}"#,
        )
        .await;

        let gateway = HttpGateway::with_base_url(base);
        let err = gateway.query(&QueryRequest::new("q")).await.unwrap_err();

        match err {
            GatewayError::Transport(message) => {
                assert!(message.contains("404"));
                assert!(message.contains("No documents in knowledge base"));
            }
            other => panic!("Expected transport failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_malformed_body_is_transport_failure() {
        let (base, _server) = serve_once("200 OK", r#"{"answer": 42}"#).await;

        let gateway = HttpGateway::with_base_url(base);
        let err = gateway.query(&QueryRequest::new("q")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_failure() {
        // Grab a free port, then close it so nothing is listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway = HttpGateway::with_base_url(format!("http://{}", addr));
        let err = gateway.ingest().await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[tokio::test]
    async fn test_ingest_success() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"message": "Ingestion complete", "profiles_ingested": 42, "edges_ingested": 7}"#,
        )
        .await;

        let gateway = HttpGateway::with_base_url(base);
        let result = gateway.ingest().await.unwrap();

        assert_eq!(result.message, "Ingestion complete");
        assert_eq!(result.profiles_ingested, 42);
        assert_eq!(result.edges_ingested, Some(7));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/rag/ingest-profiles HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_ingest_server_error_is_transport_failure() {
        let (base, _server) = serve_once("500 Internal Server Error", "").await;

        let gateway = HttpGateway::with_base_url(base);
        let err = gateway.ingest().await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(ref m) if m.contains("500")));
    }
}
