//! Report domain module.
//!
//! Defines what a report is, validates report targets, renders reports
//! for users and admins, and stores submitted reports on disk.

mod filter;
pub mod render;
mod store;
mod target;
mod types;

pub use filter::{ReportFilter, StatusCounts};
pub use store::{ReportStore, StoreError, load_reports};
pub use target::{MAX_USERNAME_LENGTH, MIN_USERNAME_LENGTH, is_valid_target};
pub use types::{Report, ReportDraft, ReportKind, ReportReason, ReportStatus, Reporter};

/// Number of reports listed by `/myreports`.
pub const HISTORY_LIMIT: usize = 5;
