//! Session state owned by the dispatcher and read by presentation through snapshots.

use std::collections::BTreeMap;

use shared::{
    domain::{ActiveView, DocumentSummary, OperationKind, QueryMode},
    protocol::{Citation, MetricValue},
};

#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus<T> {
    Idle,
    InFlight,
    Succeeded(T),
    Failed(String),
}

impl<T> Default for OperationStatus<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> OperationStatus<T> {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    pub fn phase(&self) -> OperationPhase {
        match self {
            Self::Idle => OperationPhase::Idle,
            Self::InFlight => OperationPhase::InFlight,
            Self::Succeeded(_) => OperationPhase::Succeeded,
            Self::Failed(_) => OperationPhase::Failed,
        }
    }

    pub fn succeeded(&self) -> Option<&T> {
        match self {
            Self::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Payload-free view of an [`OperationStatus`], used in change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub total_files: u64,
    pub total_chunks: u64,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerResult {
    pub answer_text: String,
    pub citations: Vec<Citation>,
    pub metrics: Option<BTreeMap<String, MetricValue>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub active_view: ActiveView,
    pub query_text: String,
    pub query_mode: QueryMode,
    /// Names confirmed by the backend, in submission order.
    pub uploaded_files: Vec<String>,
    /// Backend inventory as last reported by the catalog. Never merged with
    /// `uploaded_files`.
    pub documents: Vec<DocumentSummary>,
    pub upload: OperationStatus<UploadSummary>,
    pub query: OperationStatus<AnswerResult>,
    pub evaluation: OperationStatus<serde_json::Value>,
}

impl SessionState {
    pub fn phase(&self, kind: OperationKind) -> OperationPhase {
        match kind {
            OperationKind::Upload => self.upload.phase(),
            OperationKind::Query => self.query.phase(),
            OperationKind::Evaluate => self.evaluation.phase(),
        }
    }

    pub fn is_in_flight(&self, kind: OperationKind) -> bool {
        self.phase(kind) == OperationPhase::InFlight
    }

    pub fn failure(&self, kind: OperationKind) -> Option<&str> {
        match kind {
            OperationKind::Upload => self.upload.failure(),
            OperationKind::Query => self.query.failure(),
            OperationKind::Evaluate => self.evaluation.failure(),
        }
    }

    pub fn upload_status_line(&self) -> Option<String> {
        match &self.upload {
            OperationStatus::Idle => None,
            OperationStatus::InFlight => Some("Uploading files...".to_string()),
            OperationStatus::Succeeded(summary) => Some(format!(
                "Successfully uploaded {} file(s). Processed {} chunks.",
                summary.total_files, summary.total_chunks
            )),
            OperationStatus::Failed(message) => Some(message.clone()),
        }
    }

    /// What the answer panel shows. Empty while a query is running, so nothing
    /// from a previous question stays visible.
    pub fn answer_view(&self) -> AnswerResult {
        match &self.query {
            OperationStatus::Succeeded(answer) => answer.clone(),
            OperationStatus::Failed(message) => AnswerResult {
                answer_text: message.clone(),
                citations: Vec::new(),
                metrics: None,
            },
            OperationStatus::Idle | OperationStatus::InFlight => AnswerResult::default(),
        }
    }

    pub fn evaluation_status_line(&self) -> Option<String> {
        match &self.evaluation {
            OperationStatus::Idle => None,
            OperationStatus::InFlight => Some("Running evaluation...".to_string()),
            OperationStatus::Succeeded(result) => Some(format!(
                "Evaluation completed! Results: {}",
                serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string())
            )),
            OperationStatus::Failed(message) => Some(message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_idle_for_every_kind() {
        let state = SessionState::default();
        for kind in OperationKind::ALL {
            assert_eq!(state.phase(kind), OperationPhase::Idle);
        }
        assert_eq!(state.active_view, ActiveView::Query);
        assert_eq!(state.query_mode, QueryMode::Chat);
        assert_eq!(state.upload_status_line(), None);
        assert_eq!(state.evaluation_status_line(), None);
    }

    #[test]
    fn upload_status_line_follows_phase() {
        let mut state = SessionState {
            upload: OperationStatus::InFlight,
            ..SessionState::default()
        };
        assert_eq!(state.upload_status_line().as_deref(), Some("Uploading files..."));

        state.upload = OperationStatus::Succeeded(UploadSummary {
            total_files: 2,
            total_chunks: 14,
            files: vec!["a.pdf".into(), "b.txt".into()],
        });
        assert_eq!(
            state.upload_status_line().as_deref(),
            Some("Successfully uploaded 2 file(s). Processed 14 chunks.")
        );
    }

    #[test]
    fn failed_query_shows_error_as_answer_without_citations() {
        let state = SessionState {
            query: OperationStatus::Failed("Error: HTTP error! status: 500".into()),
            ..SessionState::default()
        };
        let view = state.answer_view();
        assert_eq!(view.answer_text, "Error: HTTP error! status: 500");
        assert!(view.citations.is_empty());
        assert!(view.metrics.is_none());
    }

    #[test]
    fn in_flight_query_hides_previous_answer() {
        let state = SessionState {
            query: OperationStatus::InFlight,
            ..SessionState::default()
        };
        assert_eq!(state.answer_view(), AnswerResult::default());
    }
}
