// src/report/mod.rs
// =============================================================================
// Reports: building them (builder), encoding them (format) and writing them
// to disk (store).
// =============================================================================

mod builder;
mod format;
mod store;

pub use builder::Report;
pub use format::read_links;
pub use store::{FsReportStore, ReportStore, StoreOutcome, StoredReport};
