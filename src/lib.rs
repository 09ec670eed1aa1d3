//! StopAnyAds - stops AnyDesk and removes its per-user data folder
//!
//! The reset is two steps that always run in order: every AnyDesk process is
//! asked to exit (and killed if it does not within three seconds), then
//! `<home>/AppData/Roaming/AnyDesk` is deleted. Failures never abort the
//! sequence; they are folded into the returned report.
//!
//! # Example
//!
//! ```no_run
//! use stopanyads::{Orchestrator, ProcessNameSet, TargetDirectory};
//!
//! let target = TargetDirectory::resolve().unwrap();
//! let mut orchestrator = Orchestrator::system(ProcessNameSet::anydesk(), target);
//! let report = orchestrator.run(|event| println!("{}", event.line()));
//! println!("terminated {} processes", report.reaper.terminated_count);
//! ```

pub mod cli;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod target;

pub use engine::{
    LogLevel, Orchestrator, PreviewReport, ProcessReaper, ProgressEvent, PurgeResult, ReaperResult,
    Report, ResetReport, ResetTask,
};
pub use error::{Result, StopError};
pub use output::{format_output, OutputFormat};
pub use target::{ProcessNameSet, TargetDirectory};
