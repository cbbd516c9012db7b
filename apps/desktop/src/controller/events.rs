//! Backend-to-UI events and error modeling for the interactive shell.

use client_core::SessionState;
use shared::domain::OperationKind;

pub enum UiEvent {
    Info(String),
    StateChanged(Box<SessionState>),
    Rejected(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Upload,
    Query,
    Evaluate,
    General,
}

impl From<OperationKind> for UiErrorContext {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Upload => Self::Upload,
            OperationKind::Query => Self::Query,
            OperationKind::Evaluate => Self::Evaluate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("status: 401")
            || message_lower.contains("status: 403")
            || message_lower.contains("unauthorized")
            || message_lower.contains("forbidden")
            || message_lower.contains("api key")
        {
            UiErrorCategory::Auth
        } else if message_lower.contains("status: 422")
            || message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("could not be sent")
            || message_lower.contains("dns")
            || message_lower.contains("unavailable")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self.category {
            UiErrorCategory::Auth => Some("check the configured API key (QA_API_KEY)"),
            UiErrorCategory::Transport => {
                Some("backend unreachable; check the base address (QA_API_BASE) and network")
            }
            UiErrorCategory::Validation | UiErrorCategory::Unknown => None,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
