//! Engine wiring and helpers shared by the command handlers.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::info;
use trellis_core::{AutoConfirm, CancelReason, Prompter};
use trellis_engine::{EngineDeps, WorkflowEngine};
use trellis_events::{BusProgressSink, Event, EventBus};
use trellis_fsops::{FsAttributeAdjuster, FsCopier, FsDiscovery, FsLinker, ShellCommandRunner};
use uuid::Uuid;

use crate::interact::{InteractiveResolver, StdinPrompter};

pub(crate) type CliResult<T> = anyhow::Result<T>;

pub(crate) const EXIT_SUCCESS: i32 = 0;
pub(crate) const EXIT_FAILURE: i32 = 1;
pub(crate) const EXIT_CANCELLED: i32 = 2;

/// Build a workflow engine wired to the real filesystem collaborators,
/// reporting progress for `run_id` on `bus`.
pub(crate) fn build_engine(bus: &EventBus, run_id: Uuid, assume_yes: bool) -> WorkflowEngine {
    let prompter: Arc<dyn Prompter> = if assume_yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(StdinPrompter)
    };
    WorkflowEngine::new(EngineDeps {
        discovery: Arc::new(FsDiscovery::new()),
        copier: Arc::new(FsCopier::new()),
        linker: Arc::new(FsLinker::new()),
        attributes: Arc::new(FsAttributeAdjuster::new()),
        commands: Arc::new(ShellCommandRunner::new()),
        prompter,
        resolver: Arc::new(InteractiveResolver),
        progress: Arc::new(BusProgressSink::new(bus.clone(), run_id)),
    })
}

/// Workspace root a relative target resolves against.
pub(crate) fn resolve_workspace_root(flag: Option<PathBuf>) -> CliResult<PathBuf> {
    match flag {
        Some(root) => Ok(root),
        None => env::current_dir().context("failed to resolve the current directory"),
    }
}

/// Human-readable cancellation summary.
pub(crate) fn cancel_reason_text(reason: CancelReason) -> String {
    match reason {
        CancelReason::ThresholdDeclined { pending_files } => {
            format!("confirmation declined for {pending_files} pending files")
        }
        CancelReason::CopyFailures { failed } => {
            format!("aborted after {failed} copy failures")
        }
    }
}

/// Spawn a task logging bus events until a terminal event arrives.
///
/// The subscription is taken before the task is spawned, so events
/// published immediately after this call are never missed.
pub(crate) fn spawn_progress_renderer(bus: &EventBus) -> JoinHandle<()> {
    let mut stream = bus.subscribe(None);
    tokio::spawn(async move {
        let mut percent: u8 = 0;
        while let Some(envelope) = stream.next().await {
            match envelope.event {
                Event::RunStarted { target_dir, .. } => {
                    info!(target = %target_dir, "run started");
                }
                Event::RunProgress {
                    increment, message, ..
                } => {
                    percent = percent.saturating_add(increment).min(100);
                    match message {
                        Some(message) => info!(percent, "{message}"),
                        None => info!(percent, "progress"),
                    }
                }
                Event::RunCompleted { .. } => {
                    info!("run completed");
                    break;
                }
                Event::RunCancelled { reason, .. } => {
                    info!(reason = %reason, "run cancelled");
                    break;
                }
                Event::RunFailed { message, .. } => {
                    info!(message = %message, "run failed");
                    break;
                }
            }
        }
    })
}
