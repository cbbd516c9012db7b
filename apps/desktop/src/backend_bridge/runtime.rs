//! Runtime bridge between the shell command queue and the dispatcher.

use std::{sync::Arc, thread};

use client_core::{Completion, DispatchRejected, Dispatcher, SessionEvent, UploadBatch};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(
    dispatcher: Arc<Dispatcher>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let events = dispatcher.subscribe_events();
            tokio::spawn(forward_session_events(
                dispatcher.clone(),
                events,
                ui_tx.clone(),
            ));
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                handle_command(&dispatcher, &ui_tx, cmd);
            }
            tracing::debug!("command queue closed; backend worker stopping");
        });
    })
}

fn handle_command(dispatcher: &Arc<Dispatcher>, ui_tx: &Sender<UiEvent>, cmd: BackendCommand) {
    let dispatcher = dispatcher.clone();
    let ui_tx = ui_tx.clone();
    match cmd {
        BackendCommand::Upload { paths } => {
            tokio::spawn(async move {
                match UploadBatch::from_paths(&paths).await {
                    Ok(batch) => report(&ui_tx, dispatcher.upload(batch).await),
                    Err(err) => {
                        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                            UiErrorContext::Upload,
                            format!("could not read selected files: {err:#}"),
                        )));
                    }
                }
            });
        }
        BackendCommand::Ask { question } => {
            tokio::spawn(async move { report(&ui_tx, dispatcher.ask(question).await) });
        }
        BackendCommand::RunEvaluation => {
            tokio::spawn(async move { report(&ui_tx, dispatcher.run_evaluation().await) });
        }
        BackendCommand::SetMode { mode } => {
            tokio::spawn(async move { dispatcher.set_query_mode(mode).await });
        }
        BackendCommand::SetView { view } => {
            tokio::spawn(async move { dispatcher.set_active_view(view).await });
        }
        BackendCommand::Render => {
            tokio::spawn(async move {
                let state = dispatcher.snapshot().await;
                let _ = ui_tx.try_send(UiEvent::StateChanged(Box::new(state)));
            });
        }
    }
}

fn report(ui_tx: &Sender<UiEvent>, result: Result<Completion, DispatchRejected>) {
    match result {
        Ok(Completion::Applied) => {}
        Ok(Completion::Superseded) => tracing::debug!("response superseded by a newer request"),
        Err(rejected) => {
            let _ = ui_tx.try_send(UiEvent::Rejected(rejected.to_string()));
        }
    }
}

async fn forward_session_events(
    dispatcher: Arc<Dispatcher>,
    mut events: broadcast::Receiver<SessionEvent>,
    ui_tx: Sender<UiEvent>,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "session observer lagged; re-rendering latest state");
                SessionEvent::SelectionChanged
            }
            Err(RecvError::Closed) => break,
        };

        let state = dispatcher.snapshot().await;
        if let SessionEvent::OperationChanged {
            kind,
            phase: client_core::OperationPhase::Failed,
            ..
        } = event
        {
            if let Some(message) = state.failure(kind) {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(kind.into(), message)));
            }
        }
        if ui_tx.try_send(UiEvent::StateChanged(Box::new(state))).is_err() {
            tracing::debug!("ui event queue unavailable; dropping render");
        }
    }
}
