//! Reset engine: process termination, data removal and the sequence tying them together

pub mod orchestrator;
pub mod purger;
pub mod reaper;

#[cfg(test)]
pub(crate) mod fake;

pub use orchestrator::{
    LogLevel, Orchestrator, PreviewReport, ProgressEvent, Report, ResetReport, ResetTask,
};
pub use purger::{measure, purge, PurgeResult, TreeStats};
pub use reaper::{
    ProcessEntry, ProcessReaper, ProcessTable, ReaperResult, SystemProcessTable, TERMINATE_TIMEOUT,
};
