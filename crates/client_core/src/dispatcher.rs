//! Turns user intents into single backend requests and applies exactly one
//! state transition per request.

use std::sync::Arc;

use shared::{
    domain::{ActiveView, OperationKind, QueryMode},
    error::OperationError,
    protocol::{IngestResponse, QueryResponse, NO_ANSWER_PLACEHOLDER},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    batch::UploadBatch,
    catalog::{DocumentCatalog, NoopCatalog},
    config::ClientConfig,
    session::{AnswerResult, OperationPhase, OperationStatus, SessionState, UploadSummary},
    transport::{HttpBackend, QaBackend},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// A kind that is already in flight cannot be dispatched again.
    #[default]
    RejectWhileInFlight,
    /// New dispatches are always issued; only the newest response is applied.
    LatestWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchRejected {
    #[error("no files selected")]
    EmptyBatch,
    #[error("question is empty")]
    EmptyQuestion,
    #[error("{0} request already in flight")]
    AlreadyInFlight(OperationKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The response arrived after a newer request of the same kind and was dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SelectionChanged,
    OperationChanged {
        kind: OperationKind,
        phase: OperationPhase,
        seq: u64,
    },
    DocumentsRefreshed {
        count: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    kind: OperationKind,
    seq: u64,
}

#[derive(Debug, Default)]
struct RequestSequences {
    upload: u64,
    query: u64,
    evaluate: u64,
}

impl RequestSequences {
    fn slot(&mut self, kind: OperationKind) -> &mut u64 {
        match kind {
            OperationKind::Upload => &mut self.upload,
            OperationKind::Query => &mut self.query,
            OperationKind::Evaluate => &mut self.evaluate,
        }
    }

    fn advance(&mut self, kind: OperationKind) -> u64 {
        let slot = self.slot(kind);
        *slot += 1;
        *slot
    }

    fn latest(&self, kind: OperationKind) -> u64 {
        match kind {
            OperationKind::Upload => self.upload,
            OperationKind::Query => self.query,
            OperationKind::Evaluate => self.evaluate,
        }
    }
}

#[derive(Default)]
struct DispatcherState {
    session: SessionState,
    sequences: RequestSequences,
}

pub struct Dispatcher {
    backend: Arc<dyn QaBackend>,
    catalog: Arc<dyn DocumentCatalog>,
    policy: DispatchPolicy,
    inner: Mutex<DispatcherState>,
    events: broadcast::Sender<SessionEvent>,
}

impl Dispatcher {
    pub fn new(config: ClientConfig) -> anyhow::Result<Arc<Self>> {
        Ok(Self::with_backend(
            Arc::new(HttpBackend::new(config)?),
            Arc::new(NoopCatalog),
            DispatchPolicy::default(),
        ))
    }

    pub fn with_backend(
        backend: Arc<dyn QaBackend>,
        catalog: Arc<dyn DocumentCatalog>,
        policy: DispatchPolicy,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            backend,
            catalog,
            policy,
            inner: Mutex::new(DispatcherState::default()),
            events,
        })
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionState {
        self.inner.lock().await.session.clone()
    }

    /// Whether the control triggering `kind` should be enabled.
    pub async fn can_dispatch(&self, kind: OperationKind) -> bool {
        match self.policy {
            DispatchPolicy::LatestWins => true,
            DispatchPolicy::RejectWhileInFlight => {
                !self.inner.lock().await.session.is_in_flight(kind)
            }
        }
    }

    pub async fn set_active_view(&self, view: ActiveView) {
        self.inner.lock().await.session.active_view = view;
        self.emit(SessionEvent::SelectionChanged);
    }

    pub async fn set_query_text(&self, text: impl Into<String>) {
        self.inner.lock().await.session.query_text = text.into();
        self.emit(SessionEvent::SelectionChanged);
    }

    pub async fn set_query_mode(&self, mode: QueryMode) {
        self.inner.lock().await.session.query_mode = mode;
        self.emit(SessionEvent::SelectionChanged);
    }

    pub async fn upload(&self, batch: UploadBatch) -> Result<Completion, DispatchRejected> {
        if batch.is_empty() {
            return Err(DispatchRejected::EmptyBatch);
        }
        for file in batch.files().iter().filter(|f| !f.has_suggested_extension()) {
            warn!(file = %file.name, "uploading file outside the suggested document types");
        }

        let ticket = self.begin(OperationKind::Upload).await?;
        info!(seq = ticket.seq, files = batch.len(), "dispatching upload");
        let outcome = self.backend.ingest(batch.files()).await;

        let completion = self
            .finish(ticket, outcome.as_ref().err(), |session| {
                session.upload = match &outcome {
                    Ok(response) => {
                        let summary = summarize_upload(response, &batch);
                        session.uploaded_files.extend(summary.files.iter().cloned());
                        OperationStatus::Succeeded(summary)
                    }
                    Err(err) => OperationStatus::Failed(format!("Upload failed: {err}")),
                };
            })
            .await;

        if completion == Completion::Applied && outcome.is_ok() {
            self.refresh_documents().await;
        }
        Ok(completion)
    }

    /// Sets the question text and submits it with the current mode. The text
    /// written here is the text sent, even when other callers race on
    /// `query_text`.
    pub async fn ask(&self, question: impl Into<String>) -> Result<Completion, DispatchRejected> {
        let question = question.into();
        let dispatched = self
            .begin_with(OperationKind::Query, |session| {
                session.query_text = question.clone();
                check_question(&question)?;
                Ok(session.query_mode)
            })
            .await;
        self.emit(SessionEvent::SelectionChanged);
        let (ticket, mode) = dispatched?;
        Ok(self.dispatch_query(ticket, &question, mode).await)
    }

    pub async fn submit_query(&self) -> Result<Completion, DispatchRejected> {
        let (ticket, (question, mode)) = self
            .begin_with(OperationKind::Query, |session| {
                check_question(&session.query_text)?;
                Ok((session.query_text.clone(), session.query_mode))
            })
            .await?;
        Ok(self.dispatch_query(ticket, &question, mode).await)
    }

    async fn dispatch_query(&self, ticket: Ticket, question: &str, mode: QueryMode) -> Completion {
        info!(seq = ticket.seq, ?mode, "dispatching query");
        let outcome = self.backend.query(question, mode).await;

        self.finish(ticket, outcome.as_ref().err(), |session| {
            session.query = match &outcome {
                Ok(response) => OperationStatus::Succeeded(answer_from_response(response)),
                Err(err) => OperationStatus::Failed(format!("Error: {err}")),
            };
        })
        .await
    }

    pub async fn run_evaluation(&self) -> Result<Completion, DispatchRejected> {
        let ticket = self.begin(OperationKind::Evaluate).await?;
        info!(seq = ticket.seq, "dispatching evaluation run");
        let outcome = self.backend.run_evaluation().await;

        Ok(self
            .finish(ticket, outcome.as_ref().err(), |session| {
                session.evaluation = match &outcome {
                    Ok(result) => OperationStatus::Succeeded(result.clone()),
                    Err(err) => OperationStatus::Failed(format!("Evaluation failed: {err}")),
                };
            })
            .await)
    }

    async fn begin(&self, kind: OperationKind) -> Result<Ticket, DispatchRejected> {
        let (ticket, ()) = self.begin_with(kind, |_| Ok(())).await?;
        Ok(ticket)
    }

    /// Runs `prepare` and claims the next sequence number for `kind` under a
    /// single lock, so what `prepare` reads is what the ticket dispatches.
    async fn begin_with<T>(
        &self,
        kind: OperationKind,
        prepare: impl FnOnce(&mut SessionState) -> Result<T, DispatchRejected>,
    ) -> Result<(Ticket, T), DispatchRejected> {
        let (seq, prepared) = {
            let mut guard = self.inner.lock().await;
            let prepared = prepare(&mut guard.session)?;
            if self.policy == DispatchPolicy::RejectWhileInFlight
                && guard.session.is_in_flight(kind)
            {
                return Err(DispatchRejected::AlreadyInFlight(kind));
            }
            let seq = guard.sequences.advance(kind);
            match kind {
                OperationKind::Upload => guard.session.upload = OperationStatus::InFlight,
                OperationKind::Query => guard.session.query = OperationStatus::InFlight,
                OperationKind::Evaluate => guard.session.evaluation = OperationStatus::InFlight,
            }
            (seq, prepared)
        };
        self.emit(SessionEvent::OperationChanged {
            kind,
            phase: OperationPhase::InFlight,
            seq,
        });
        Ok((Ticket { kind, seq }, prepared))
    }

    async fn finish(
        &self,
        ticket: Ticket,
        failure: Option<&OperationError>,
        apply: impl FnOnce(&mut SessionState),
    ) -> Completion {
        let phase = {
            let mut guard = self.inner.lock().await;
            let latest = guard.sequences.latest(ticket.kind);
            if latest != ticket.seq {
                debug!(
                    kind = %ticket.kind,
                    seq = ticket.seq,
                    latest,
                    "discarding response from superseded request"
                );
                return Completion::Superseded;
            }
            apply(&mut guard.session);
            guard.session.phase(ticket.kind)
        };

        match failure {
            Some(err) => warn!(kind = %ticket.kind, seq = ticket.seq, "request failed: {err}"),
            None => info!(kind = %ticket.kind, seq = ticket.seq, "request completed"),
        }
        self.emit(SessionEvent::OperationChanged {
            kind: ticket.kind,
            phase,
            seq: ticket.seq,
        });
        Completion::Applied
    }

    async fn refresh_documents(&self) {
        match self.catalog.refresh().await {
            Ok(Some(documents)) => {
                let count = documents.len();
                self.inner.lock().await.session.documents = documents;
                self.emit(SessionEvent::DocumentsRefreshed { count });
            }
            Ok(None) => {}
            Err(err) => warn!("document inventory refresh failed: {err:#}"),
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; state stays readable through snapshots.
        let _ = self.events.send(event);
    }
}

fn summarize_upload(response: &IngestResponse, batch: &UploadBatch) -> UploadSummary {
    UploadSummary {
        total_files: response.total_files.unwrap_or(batch.len() as u64),
        total_chunks: response.total_chunks.unwrap_or(0),
        files: batch.file_names(),
    }
}

fn check_question(question: &str) -> Result<(), DispatchRejected> {
    if question.trim().is_empty() {
        return Err(DispatchRejected::EmptyQuestion);
    }
    Ok(())
}

fn answer_from_response(response: &QueryResponse) -> AnswerResult {
    AnswerResult {
        answer_text: response
            .answer
            .clone()
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| NO_ANSWER_PLACEHOLDER.to_string()),
        citations: response.citations.clone().unwrap_or_default(),
        metrics: response.metrics.clone(),
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
