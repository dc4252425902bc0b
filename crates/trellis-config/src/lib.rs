#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Workspace profile configuration: typed model, JSON loading, validation.
//!
//! Layout: `model.rs` (serde document model), `loader.rs` (file loading),
//! `validate.rs` (structural rules), `error.rs` (`ConfigError`).

pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_profile, parse_profile};
pub use model::{
    ActionKind, AttributeSpec, ConflictChoice, ItemKind, OperationSpec, PathMapping,
    PathOrMapping, PatternKind, PatternValue, PostCommand, SearchPattern, WorkspaceProfile,
};
pub use validate::validate_profile;
