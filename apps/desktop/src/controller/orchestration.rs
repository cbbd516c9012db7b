//! Command orchestration from shell input to the backend command queue.

use std::path::PathBuf;

use crossbeam_channel::{Sender, TrySendError};
use shared::domain::{ActiveView, QueryMode};

use crate::backend_bridge::commands::BackendCommand;

pub const SHELL_HELP: &str = "\
:upload <path>...   upload documents
:mode chat|form     select query mode
:view query|upload|eval
:eval               run the evaluation suite
:show               re-render the active view
:quit               leave the shell
anything else is asked as a question";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAction {
    Command(BackendCommand),
    Help,
    Quit,
    Invalid(String),
    Ignore,
}

pub fn parse_shell_line(line: &str) -> ShellAction {
    let line = line.trim();
    if line.is_empty() {
        return ShellAction::Ignore;
    }
    let Some(rest) = line.strip_prefix(':') else {
        return ShellAction::Command(BackendCommand::Ask {
            question: line.to_string(),
        });
    };

    let mut words = rest.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();
    match verb {
        "upload" if args.is_empty() => ShellAction::Invalid("select at least one file".into()),
        "upload" => ShellAction::Command(BackendCommand::Upload {
            paths: args.iter().map(|p| PathBuf::from(*p)).collect(),
        }),
        "mode" => match args.first().and_then(|m| QueryMode::parse(m)) {
            Some(mode) => ShellAction::Command(BackendCommand::SetMode { mode }),
            None => ShellAction::Invalid("usage: :mode chat|form".into()),
        },
        "view" => match args.first().and_then(|v| ActiveView::parse(v)) {
            Some(view) => ShellAction::Command(BackendCommand::SetView { view }),
            None => ShellAction::Invalid("usage: :view query|upload|eval".into()),
        },
        "eval" => ShellAction::Command(BackendCommand::RunEvaluation),
        "show" => ShellAction::Command(BackendCommand::Render),
        "help" | "h" | "?" => ShellAction::Help,
        "quit" | "q" | "exit" => ShellAction::Quit,
        other => ShellAction::Invalid(format!("unknown command ':{other}' (try :help)")),
    }
}

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued shell->backend command"),
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "shell->backend command queue is full");
            *status = "Command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend worker disconnected (possible startup/runtime failure); restart the shell"
                    .to_string();
        }
    }
}
