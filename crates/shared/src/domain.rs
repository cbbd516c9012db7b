use std::fmt;

use serde::{Deserialize, Serialize};

/// Selects which variant of the query endpoint a question is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    #[default]
    Chat,
    FormFill,
}

impl QueryMode {
    /// Value of the `mode` query-string flag, if the mode needs one.
    pub fn query_flag(self) -> Option<&'static str> {
        match self {
            Self::Chat => None,
            Self::FormFill => Some("form"),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "chat" | "qa" | "answer" => Some(Self::Chat),
            "form" | "form_fill" | "form-fill" | "formfill" => Some(Self::FormFill),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    #[default]
    Query,
    Upload,
    Evaluation,
}

impl ActiveView {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "query" => Some(Self::Query),
            "upload" => Some(Self::Upload),
            "eval" | "evaluation" => Some(Self::Evaluation),
            _ => None,
        }
    }
}

/// The three independent operation kinds tracked by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Upload,
    Query,
    Evaluate,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [Self::Upload, Self::Query, Self::Evaluate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Query => "query",
            Self::Evaluate => "evaluate",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub title: String,
}
