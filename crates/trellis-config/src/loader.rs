//! Profile loading from JSON documents on disk.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::WorkspaceProfile;
use crate::validate::validate_profile;

/// Read, parse, and validate a workspace profile from `path`.
///
/// # Errors
///
/// Returns an error when the file cannot be read, is not valid JSON, or
/// fails structural validation.
pub fn load_profile(path: &Path) -> ConfigResult<WorkspaceProfile> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::io("load_profile.read", path, source))?;
    let profile = parse_profile(&raw, path)?;
    validate_profile(&profile)?;
    debug!(
        path = %path.display(),
        operations = profile.operations.len(),
        post_commands = profile.post_commands.len(),
        "workspace profile loaded"
    );
    Ok(profile)
}

/// Parse a profile from an in-memory JSON document without validating it.
///
/// # Errors
///
/// Returns an error when `raw` is not a valid profile document.
pub fn parse_profile(raw: &str, origin: &Path) -> ConfigResult<WorkspaceProfile> {
    serde_json::from_str(raw).map_err(|source| ConfigError::Json {
        path: origin.to_path_buf(),
        source,
    })
}
