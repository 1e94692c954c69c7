//! HTML training reports and the plots embedded in them.

pub mod plots;
pub mod report;

pub use report::{Report, ReportSection};
