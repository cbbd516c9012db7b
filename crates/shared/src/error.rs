use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Http,
    MalformedResponse,
}

/// Every way a single backend call can fail. All variants end up as the same
/// user-facing string attached to the failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("request could not be sent: {0}")]
    Transport(String),
    #[error("HTTP error! status: {status}{}", reason_suffix(.reason))]
    Http { status: u16, reason: Option<String> },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!(" ({reason})"),
        _ => String::new(),
    }
}

impl OperationError {
    pub fn http(status: u16) -> Self {
        Self::Http {
            status,
            reason: None,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transport,
            Self::Http { .. } => FailureKind::Http,
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_failure_message_carries_status_code() {
        assert_eq!(
            OperationError::http(503).to_string(),
            "HTTP error! status: 503"
        );
        let with_reason = OperationError::Http {
            status: 401,
            reason: Some("Unauthorized".into()),
        };
        assert_eq!(with_reason.to_string(), "HTTP error! status: 401 (Unauthorized)");
        assert_eq!(with_reason.status(), Some(401));
    }

    #[test]
    fn classifies_failure_kinds() {
        assert_eq!(
            OperationError::Transport("refused".into()).kind(),
            FailureKind::Transport
        );
        assert_eq!(
            OperationError::MalformedResponse("eof".into()).kind(),
            FailureKind::MalformedResponse
        );
        assert_eq!(OperationError::Transport("x".into()).status(), None);
    }
}
