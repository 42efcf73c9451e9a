//! sds-sync
//!
//! Student roster -> directory reconciliation.
//!
//! - `rules`: pure mapping from one roster row to attribute deltas.
//! - `reconcile`: one lookup per row, then one conditional replace per rule
//!   group. Per-write rejections are contained; transport loss is not.
//! - `stats`: per-category comparison of roster rows against directory
//!   membership by `company`.
//! - `orchestrator`: the batch, in input order, then the statistics.

mod orchestrator;
mod reconcile;
mod rules;
mod stats;
mod types;

pub use orchestrator::run_sync;
pub use reconcile::{reconcile_record, LOOKUP_ATTRIBUTES, MAIL_ATTRIBUTE};
pub use rules::{
    Category, RuleGroup, RuleSet, ATTR_COMPANY, ATTR_DEPARTMENT, ATTR_DESCRIPTION,
    ATTR_EMPLOYEE_ID, ATTR_EMPLOYEE_NUMBER, ATTR_OFFICE, ATTR_TITLE,
};
pub use stats::{diff_category, report};
pub use types::*;
