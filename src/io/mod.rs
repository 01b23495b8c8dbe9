//! I/O module for batch input and report output

pub mod json;
pub mod report;

pub use json::{read_batch, write_batch};
pub use report::{InstanceEntry, LoadReport, RecordEntry, ReportSummary};
