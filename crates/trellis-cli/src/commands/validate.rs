//! Handler for `trellis validate`.

use trellis_config::load_profile;

use crate::cli::ValidateArgs;
use crate::context::{CliResult, EXIT_SUCCESS};

pub(crate) fn run(args: &ValidateArgs) -> CliResult<i32> {
    let profile = load_profile(&args.config)?;
    println!(
        "profile OK: {} operations, {} post commands, target '{}'",
        profile.operations.len(),
        profile.post_commands.len(),
        profile.target_dir
    );
    Ok(EXIT_SUCCESS)
}
