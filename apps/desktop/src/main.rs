use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
    thread,
};

mod backend_bridge;
mod controller;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{load_settings, Dispatcher, UploadBatch};
use crossbeam_channel::{bounded, Receiver};
use shared::domain::{ActiveView, OperationKind, QueryMode};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::UiEvent,
    orchestration::{dispatch_backend_command, parse_shell_line, ShellAction, SHELL_HELP},
};
use crate::ui::render::render_session;

#[derive(Parser, Debug)]
#[command(name = "qa_desktop", about = "Policy Q&A client: upload, ask, evaluate")]
struct Args {
    /// Backend base address; overrides the build-time default.
    #[arg(long, global = true)]
    api_base: Option<String>,
    #[arg(long, global = true)]
    api_key: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload one or more documents for ingestion.
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Ask a question against the uploaded documents.
    Ask {
        #[arg(long, value_enum, default_value_t = ModeArg::Chat)]
        mode: ModeArg,
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Run the backend evaluation suite.
    Eval,
    /// Interactive session.
    Shell,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Chat,
    Form,
}

impl From<ModeArg> for QueryMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Chat => QueryMode::Chat,
            ModeArg::Form => QueryMode::FormFill,
        }
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(base) = args.api_base {
        settings.api_base = Some(base);
    }
    if let Some(key) = args.api_key {
        settings.api_key = key;
    }
    let config = settings.into_client_config()?;
    tracing::info!(base_url = %config.base_url, "using backend");
    let dispatcher = Dispatcher::new(config)?;

    match args.command {
        Command::Shell => run_shell(dispatcher).map(|()| ExitCode::SUCCESS),
        command => run_once(dispatcher, command),
    }
}

fn run_once(dispatcher: Arc<Dispatcher>, command: Command) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    runtime.block_on(execute(dispatcher, command))
}

async fn execute(dispatcher: Arc<Dispatcher>, command: Command) -> Result<ExitCode> {
    let kind = match command {
        Command::Upload { paths } => {
            let batch = UploadBatch::from_paths(&paths).await?;
            dispatcher.set_active_view(ActiveView::Upload).await;
            dispatcher.upload(batch).await?;
            OperationKind::Upload
        }
        Command::Ask { mode, question } => {
            dispatcher.set_query_mode(mode.into()).await;
            dispatcher.ask(question.join(" ")).await?;
            OperationKind::Query
        }
        Command::Eval => {
            dispatcher.set_active_view(ActiveView::Evaluation).await;
            dispatcher.run_evaluation().await?;
            OperationKind::Evaluate
        }
        Command::Shell => anyhow::bail!("the shell is not a one-shot command"),
    };

    let state = dispatcher.snapshot().await;
    print!("{}", render_session(&state));
    Ok(if state.failure(kind).is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_shell(dispatcher: Arc<Dispatcher>) -> Result<()> {
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(dispatcher, cmd_rx, ui_tx);
    thread::spawn(move || render_loop(ui_rx));

    println!("{SHELL_HELP}");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read shell input")?;
        let mut status = String::new();
        match parse_shell_line(&line) {
            ShellAction::Command(cmd) => dispatch_backend_command(&cmd_tx, cmd, &mut status),
            ShellAction::Help => println!("{SHELL_HELP}"),
            ShellAction::Quit => break,
            ShellAction::Invalid(message) => status = message,
            ShellAction::Ignore => {}
        }
        if !status.is_empty() {
            eprintln!("{status}");
        }
        io::stdout().flush().ok();
    }
    Ok(())
}

fn render_loop(ui_rx: Receiver<UiEvent>) {
    while let Ok(event) = ui_rx.recv() {
        match event {
            UiEvent::Info(message) => tracing::info!("{message}"),
            UiEvent::StateChanged(state) => println!("{}", render_session(&state)),
            UiEvent::Rejected(reason) => eprintln!("not sent: {reason}"),
            UiEvent::Error(err) => {
                tracing::debug!(context = ?err.context(), category = ?err.category(), "operation failed");
                match err.hint() {
                    Some(hint) => eprintln!("{} ({hint})", err.message()),
                    None => eprintln!("{}", err.message()),
                }
            }
        }
    }
}
