use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Multipart field name shared by every file part of an ingest request.
pub const INGEST_FILE_FIELD: &str = "files";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const NO_ANSWER_PLACEHOLDER: &str = "No answer provided";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_files: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub citations: Option<Vec<Citation>>,
    #[serde(default)]
    pub metrics: Option<BTreeMap<String, MetricValue>>,
}

/// Citation fields are shown verbatim; any that the backend leaves out stay
/// empty rather than failing the whole answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, alias = "doc_id")]
    pub document_id: String,
    #[serde(default)]
    pub chunk_id: String,
    #[serde(default, alias = "snippet")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// A single metric as reported by the backend. Form-fill answers report
/// flags and labels next to the numeric timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Other(serde_json::Value),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}
