//! Conversation turns.
//!
//! An assistant turn is either an answer with citations or a failure
//! placeholder. The two are distinct variants so callers never have to
//! compare message strings to tell them apart.

use nexus_gateway::{Citation, GatewayError};
use serde::{Deserialize, Serialize};

/// Text shown in place of an answer when a query fails.
pub const FALLBACK_MESSAGE: &str = "Sorry, I encountered an error while processing your request.";

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Category of a failed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Transport,
    Timeout,
    Cancelled,
}

/// Why a backend call produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,

    /// Diagnostic text; not meant for end users
    pub detail: String,
}

impl From<&GatewayError> for FailureReason {
    fn from(err: &GatewayError) -> Self {
        let kind = match err {
            GatewayError::Transport(_) => FailureKind::Transport,
            GatewayError::Timeout(_) => FailureKind::Timeout,
            GatewayError::Cancelled => FailureKind::Cancelled,
        };

        Self {
            kind,
            detail: err.to_string(),
        }
    }
}

/// Payload of an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AssistantReply {
    /// The backend answered; sources keep backend order
    Answer {
        content: String,
        sources: Vec<Citation>,
    },

    /// The query failed; rendered with [`FALLBACK_MESSAGE`]
    Failed { reason: FailureReason },
}

/// One message in the conversation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Turn {
    User { content: String },
    Assistant(AssistantReply),
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Turn::User {
            content: content.into(),
        }
    }

    pub fn answer(content: impl Into<String>, sources: Vec<Citation>) -> Self {
        Turn::Assistant(AssistantReply::Answer {
            content: content.into(),
            sources,
        })
    }

    pub fn failed(reason: FailureReason) -> Self {
        Turn::Assistant(AssistantReply::Failed { reason })
    }

    pub fn role(&self) -> Role {
        match self {
            Turn::User { .. } => Role::User,
            Turn::Assistant(_) => Role::Assistant,
        }
    }

    /// Message body as shown to the user.
    pub fn content(&self) -> &str {
        match self {
            Turn::User { content } => content,
            Turn::Assistant(AssistantReply::Answer { content, .. }) => content,
            Turn::Assistant(AssistantReply::Failed { .. }) => FALLBACK_MESSAGE,
        }
    }

    /// Citations of a successful answer.
    ///
    /// `None` for user turns and failures; `Some(&[])` for an answer that
    /// cited nothing.
    pub fn sources(&self) -> Option<&[Citation]> {
        match self {
            Turn::Assistant(AssistantReply::Answer { sources, .. }) => Some(sources),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Turn::Assistant(AssistantReply::Failed { reason }) => Some(reason),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_user_turn() {
        let turn = Turn::user("hello");
        assert_eq!(turn.role(), Role::User);
        assert_eq!(turn.content(), "hello");
        assert!(turn.sources().is_none());
        assert!(!turn.is_failure());
    }

    #[test]
    fn test_answer_turn() {
        let turn = Turn::answer("A", vec![Citation::new("C", "bob")]);
        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.content(), "A");
        assert_eq!(turn.sources(), Some(&[Citation::new("C", "bob")][..]));
    }

    #[test]
    fn test_answer_without_citations_is_not_absent() {
        let turn = Turn::answer("A", Vec::new());
        assert_eq!(turn.sources(), Some(&[][..]));
        assert!(!turn.is_failure());
    }

    #[test]
    fn test_failed_turn_uses_fallback() {
        let reason = FailureReason::from(&GatewayError::Transport("down".to_string()));
        let turn = Turn::failed(reason);

        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.content(), FALLBACK_MESSAGE);
        assert!(turn.sources().is_none());
        assert_eq!(turn.failure().map(|r| r.kind), Some(FailureKind::Transport));
    }

    #[test]
    fn test_failure_kind_mapping() {
        let timeout = FailureReason::from(&GatewayError::Timeout(Duration::from_secs(1)));
        assert_eq!(timeout.kind, FailureKind::Timeout);

        let cancelled = FailureReason::from(&GatewayError::Cancelled);
        assert_eq!(cancelled.kind, FailureKind::Cancelled);
        assert_eq!(cancelled.detail, "request cancelled");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Turn::answer("A", vec![Citation::new("C", "bob")])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "assistant",
                "status": "answer",
                "content": "A",
                "sources": [{"content": "C", "metadata": {"username": "bob"}}]
            })
        );

        let json = serde_json::to_value(Turn::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
