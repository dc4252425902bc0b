//! Filesystem-backed collaborators for the workflow engine.
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
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::permissions_set_readonly_false,
    clippy::redundant_pub_crate
)]

mod attributes;
mod commands;
mod conflict;
mod copier;
mod discovery;
mod error;
mod linker;

pub use attributes::{BACKUP_FILE_NAME, FsAttributeAdjuster};
pub use commands::ShellCommandRunner;
pub use copier::FsCopier;
pub use discovery::FsDiscovery;
pub use error::{FsOpsError, FsOpsResult};
pub use linker::FsLinker;
