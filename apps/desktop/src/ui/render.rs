use std::fmt::Write as _;

use client_core::{AnswerResult, SessionState};
use shared::{
    domain::{ActiveView, QueryMode},
    protocol::{Citation, MetricValue},
};

pub fn mode_label(mode: QueryMode) -> &'static str {
    match mode {
        QueryMode::Chat => "Regular Q&A",
        QueryMode::FormFill => "Form Filling",
    }
}

pub fn format_score(score: f64) -> String {
    format!("{score:.3}")
}

pub fn format_metric(value: &MetricValue) -> String {
    match value {
        MetricValue::Number(n) => format!("{n:.3}"),
        MetricValue::Flag(flag) => flag.to_string(),
        MetricValue::Text(text) => text.clone(),
        MetricValue::Other(raw) => raw.to_string(),
    }
}

pub fn render_citation(citation: &Citation) -> String {
    let mut out = format!(
        "Document: {} | Chunk: {}\n  {}",
        citation.document_id, citation.chunk_id, citation.text
    );
    if let Some(score) = citation.score {
        let _ = write!(out, "\n  Relevance Score: {}", format_score(score));
    }
    out
}

pub fn render_answer(answer: &AnswerResult) -> String {
    let mut out = String::new();
    if !answer.answer_text.is_empty() {
        let _ = writeln!(out, "Answer:\n{}", answer.answer_text);
    }
    if !answer.citations.is_empty() {
        let _ = writeln!(out, "\nCitations:");
        for citation in &answer.citations {
            let _ = writeln!(out, "- {}", render_citation(citation));
        }
    }
    if let Some(metrics) = &answer.metrics {
        let _ = writeln!(out, "\nQuery Metrics:");
        for (name, value) in metrics {
            let _ = writeln!(out, "  {name}: {}", format_metric(value));
        }
    }
    out
}

fn render_query_view(state: &SessionState, out: &mut String) {
    let _ = writeln!(out, "[Query] mode: {}", mode_label(state.query_mode));
    if state.query.is_in_flight() {
        let _ = writeln!(out, "Analyzing documents and generating response...");
        return;
    }
    out.push_str(&render_answer(&state.answer_view()));
}

fn render_upload_view(state: &SessionState, out: &mut String) {
    let _ = writeln!(out, "[Upload Documents]");
    if let Some(line) = state.upload_status_line() {
        let _ = writeln!(out, "{line}");
    }
    if !state.uploaded_files.is_empty() {
        let _ = writeln!(out, "Uploaded Files:");
        for name in &state.uploaded_files {
            let _ = writeln!(out, "  {name}");
        }
    }
    if !state.documents.is_empty() {
        let _ = writeln!(out, "Documents:");
        for doc in &state.documents {
            let _ = writeln!(out, "  {} ({})", doc.title, doc.document_id);
        }
    }
}

fn render_evaluation_view(state: &SessionState, out: &mut String) {
    let _ = writeln!(out, "[Evaluation]");
    match state.evaluation_status_line() {
        Some(line) => {
            let _ = writeln!(out, "{line}");
        }
        None => {
            let _ = writeln!(
                out,
                "Run the evaluation suite against your uploaded documents with :eval"
            );
        }
    }
}

/// Renders whatever the active view shows.
pub fn render_session(state: &SessionState) -> String {
    let mut out = String::new();
    match state.active_view {
        ActiveView::Query => render_query_view(state, &mut out),
        ActiveView::Upload => render_upload_view(state, &mut out),
        ActiveView::Evaluation => render_evaluation_view(state, &mut out),
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use client_core::{OperationStatus, UploadSummary};

    use super::*;

    #[test]
    fn numbers_render_with_three_decimals() {
        assert_eq!(format_score(0.87), "0.870");
        assert_eq!(format_metric(&MetricValue::Number(1.2)), "1.200");
        assert_eq!(format_metric(&MetricValue::Flag(true)), "true");
        assert_eq!(format_metric(&MetricValue::Text("leave".into())), "leave");
    }

    #[test]
    fn citation_without_score_omits_relevance_line() {
        let rendered = render_citation(&Citation {
            document_id: "d1".into(),
            chunk_id: "c1".into(),
            text: "t1".into(),
            score: None,
        });
        assert_eq!(rendered, "Document: d1 | Chunk: c1\n  t1");
    }

    #[test]
    fn query_view_lists_answer_citations_and_metrics() {
        let state = SessionState {
            query: OperationStatus::Succeeded(AnswerResult {
                answer_text: "X".into(),
                citations: vec![Citation {
                    document_id: "d1".into(),
                    chunk_id: "c1".into(),
                    text: "t1".into(),
                    score: Some(0.87),
                }],
                metrics: Some(BTreeMap::from([(
                    "latency".to_string(),
                    MetricValue::Number(1.2),
                )])),
            }),
            ..SessionState::default()
        };
        let rendered = render_session(&state);
        assert!(rendered.contains("Answer:\nX"));
        assert!(rendered.contains("Relevance Score: 0.870"));
        assert!(rendered.contains("latency: 1.200"));
    }

    #[test]
    fn in_flight_query_shows_progress_only() {
        let state = SessionState {
            query: OperationStatus::InFlight,
            ..SessionState::default()
        };
        let rendered = render_session(&state);
        assert!(rendered.contains("Analyzing documents"));
        assert!(!rendered.contains("Answer:"));
    }

    #[test]
    fn upload_view_shows_status_and_files() {
        let state = SessionState {
            active_view: ActiveView::Upload,
            uploaded_files: vec!["a.pdf".into()],
            upload: OperationStatus::Succeeded(UploadSummary {
                total_files: 1,
                total_chunks: 3,
                files: vec!["a.pdf".into()],
            }),
            ..SessionState::default()
        };
        let rendered = render_session(&state);
        assert!(rendered.contains("Successfully uploaded 1 file(s). Processed 3 chunks."));
        assert!(rendered.contains("  a.pdf"));
    }
}
