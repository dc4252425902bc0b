//! Handler for `trellis apply`.

use trellis_config::load_profile;
use trellis_core::WorkflowOutcome;
use trellis_events::{Event, EventBus};
use uuid::Uuid;

use crate::cli::ApplyArgs;
use crate::context::{self, CliResult, EXIT_CANCELLED, EXIT_SUCCESS};

pub(crate) async fn run(args: ApplyArgs) -> CliResult<i32> {
    let mut profile = load_profile(&args.config)?;
    if args.silent {
        profile.silent = true;
    }
    let workspace_root = context::resolve_workspace_root(args.workspace_root)?;

    let run_id = Uuid::new_v4();
    let bus = EventBus::new();
    let renderer = context::spawn_progress_renderer(&bus);
    let engine = context::build_engine(&bus, run_id, args.yes || profile.silent);

    let _ = bus.publish(Event::RunStarted {
        run_id,
        target_dir: profile.target_dir.clone(),
    });

    let outcome = engine
        .run(&profile, Some(&workspace_root))
        .await
        .map_err(anyhow::Error::from);

    let terminal = match &outcome {
        Ok(WorkflowOutcome::Completed) => Event::RunCompleted { run_id },
        Ok(WorkflowOutcome::Cancelled { reason }) => Event::RunCancelled {
            run_id,
            reason: context::cancel_reason_text(*reason),
        },
        Err(error) => Event::RunFailed {
            run_id,
            message: format!("{error:#}"),
        },
    };
    let _ = bus.publish(terminal);
    let _ = renderer.await;

    match outcome? {
        WorkflowOutcome::Completed => Ok(EXIT_SUCCESS),
        WorkflowOutcome::Cancelled { .. } => Ok(EXIT_CANCELLED),
    }
}
