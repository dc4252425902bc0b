//! Engine-agnostic workflow interfaces and DTOs.
//!
//! The execution engine reaches every filesystem, shell, and UI concern
//! through the traits defined here; adapters live in sibling crates.

pub mod model;
pub mod resolver;
pub mod service;

pub use model::{
    AttributeAdjustment, CancelReason, CommandStatus, CopyOutcome, PlannedOperation,
    ProgressUpdate, WorkflowOutcome,
};
pub use resolver::{AutoConfirm, SilentResolver};
pub use service::{
    AttributeAdjuster, CommandRunner, ConflictResolver, CopyEngine, LinkEngine, ProgressSink,
    Prompter, SourceDiscovery,
};
