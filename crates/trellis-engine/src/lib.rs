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
#![allow(clippy::redundant_pub_crate)]

//! Workflow execution engine: planning, deduplication, and ordered
//! execution of bulk copy and link operations.
//!
//! The engine owns policy (ordering, gating, reconciliation, progress) and
//! delegates every filesystem, shell, and UI effect through the
//! `trellis-core` collaborator traits.

mod dedupe;
mod error;
mod plan;
mod progress;
mod service;

pub use dedupe::dedupe_buckets;
pub use error::{EngineError, EngineResult};
pub use plan::{OperationBuckets, Planner, WorkflowPlan, resolve_target_root};
pub use progress::progress_percent;
pub use service::{EngineDeps, WorkflowEngine};
