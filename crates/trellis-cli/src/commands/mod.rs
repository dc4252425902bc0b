//! Command handlers grouped by concern.

pub(crate) mod apply;
pub(crate) mod plan;
pub(crate) mod validate;
