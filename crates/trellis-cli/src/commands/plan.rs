//! Handler for `trellis plan`.

use trellis_config::load_profile;
use trellis_events::EventBus;
use uuid::Uuid;

use crate::cli::PlanArgs;
use crate::context::{self, CliResult, EXIT_SUCCESS};
use crate::output;

pub(crate) async fn run(args: PlanArgs) -> CliResult<i32> {
    let profile = load_profile(&args.config)?;
    let workspace_root = context::resolve_workspace_root(args.workspace_root)?;

    // Planning never prompts, so the engine gets non-interactive collaborators.
    let bus = EventBus::new();
    let engine = context::build_engine(&bus, Uuid::new_v4(), true);
    let plan = engine.plan(&profile, Some(&workspace_root)).await?;

    output::render_plan(&plan, args.output)?;
    Ok(EXIT_SUCCESS)
}
