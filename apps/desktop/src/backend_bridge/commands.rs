//! Backend commands queued from the shell to the backend worker.

use shared::domain::{ActiveView, QueryMode};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Upload { paths: Vec<PathBuf> },
    Ask { question: String },
    SetMode { mode: QueryMode },
    SetView { view: ActiveView },
    RunEvaluation,
    Render,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Upload { .. } => "upload",
            Self::Ask { .. } => "ask",
            Self::SetMode { .. } => "set_mode",
            Self::SetView { .. } => "set_view",
            Self::RunEvaluation => "run_evaluation",
            Self::Render => "render",
        }
    }
}
