//! Runs the reaper and then the purger, narrating progress as it goes.

use crate::engine::purger::{self, PurgeResult};
use crate::engine::reaper::{
    ProcessEntry, ProcessReaper, ProcessTable, ReaperResult, SystemProcessTable,
};
use crate::error::{Result, StopError};
use crate::target::{ProcessNameSet, TargetDirectory, TARGET_APP};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Good,
    Warn,
    Bad,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[*] ",
            LogLevel::Good => "[✓] ",
            LogLevel::Warn => "[!] ",
            LogLevel::Bad => "[x] ",
        }
    }
}

/// One line of the progress log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub level: LogLevel,
    pub message: String,
    /// Overall completion in `0.0..=1.0`.
    pub fraction: f32,
    pub timestamp: DateTime<Local>,
}

impl ProgressEvent {
    pub fn new(level: LogLevel, message: impl Into<String>, fraction: f32) -> Self {
        Self {
            level,
            message: message.into(),
            fraction: fraction.clamp(0.0, 1.0),
            timestamp: Local::now(),
        }
    }

    pub fn line(&self) -> String {
        format!("{}{}", self.level.prefix(), self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetReport {
    pub target_dir: PathBuf,
    pub reaper: ReaperResult,
    pub purge: PurgeResult,
    pub log: Vec<ProgressEvent>,
}

/// What a reset would touch, gathered without changing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewReport {
    pub target_dir: PathBuf,
    pub enumeration_available: bool,
    pub processes: Vec<ProcessEntry>,
    pub directory_exists: bool,
    pub total_bytes: u64,
    pub entry_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Report {
    Reset(ResetReport),
    Preview(PreviewReport),
}

/// Collects events while forwarding them to the caller's sink.
struct Narrator<F> {
    sink: F,
    log: Vec<ProgressEvent>,
}

impl<F: FnMut(&ProgressEvent)> Narrator<F> {
    fn emit(&mut self, level: LogLevel, message: impl Into<String>, fraction: f32) {
        let event = ProgressEvent::new(level, message, fraction);
        (self.sink)(&event);
        self.log.push(event);
    }
}

/// Termination always precedes deletion, and deletion runs whatever the
/// termination outcome was.
pub struct Orchestrator<T> {
    reaper: ProcessReaper<T>,
    names: ProcessNameSet,
    target: TargetDirectory,
}

impl Orchestrator<SystemProcessTable> {
    pub fn system(names: ProcessNameSet, target: TargetDirectory) -> Self {
        Self::new(ProcessReaper::system(), names, target)
    }
}

impl<T: ProcessTable> Orchestrator<T> {
    pub fn new(reaper: ProcessReaper<T>, names: ProcessNameSet, target: TargetDirectory) -> Self {
        Self {
            reaper,
            names,
            target,
        }
    }

    pub fn target(&self) -> &TargetDirectory {
        &self.target
    }

    /// Runs the whole reset on the current thread.
    pub fn run(&mut self, on_progress: impl FnMut(&ProgressEvent)) -> ResetReport {
        let mut narrator = Narrator {
            sink: on_progress,
            log: Vec::new(),
        };

        narrator.emit(LogLevel::Info, "Starting reset...", 0.0);
        narrator.emit(
            LogLevel::Info,
            format!("Terminating {} processes...", TARGET_APP),
            0.0,
        );

        let reaper = self.reaper.reap(&self.names);
        info!(
            terminated = reaper.terminated_count,
            errors = reaper.error_count,
            fallback = reaper.used_fallback_kill,
            "process termination finished"
        );
        if reaper.used_fallback_kill {
            narrator.emit(
                LogLevel::Warn,
                "Used system kill command (process enumeration unavailable).",
                0.3,
            );
        }
        let level = if reaper.error_count > 0 {
            LogLevel::Warn
        } else {
            LogLevel::Good
        };
        narrator.emit(
            level,
            format!(
                "Processes terminated: {}. Errors: {}.",
                reaper.terminated_count, reaper.error_count
            ),
            0.3,
        );

        narrator.emit(
            LogLevel::Info,
            format!("Deleting data folder: {}", self.target.path().display()),
            0.3,
        );
        let purge = purger::purge(&self.target);
        info!(
            existed = purge.directory_existed,
            succeeded = purge.deletion_succeeded,
            "data folder purge finished"
        );
        match (&purge.error_message, purge.directory_existed) {
            (Some(err), _) => narrator.emit(LogLevel::Bad, format!("Delete error: {}", err), 0.75),
            (None, true) => {
                narrator.emit(LogLevel::Good, "Data folder deleted successfully.", 0.75)
            }
            (None, false) => narrator.emit(
                LogLevel::Warn,
                "Data folder not found. Possibly already removed.",
                0.75,
            ),
        }

        narrator.emit(LogLevel::Info, "Finalizing...", 0.75);
        if purge.error_message.is_some() {
            narrator.emit(
                LogLevel::Warn,
                format!(
                    "Done. {} stopped, but its data folder was not fully removed.",
                    TARGET_APP
                ),
                1.0,
            );
        } else {
            narrator.emit(
                LogLevel::Good,
                format!("Done. {} stopped and data cleaned.", TARGET_APP),
                1.0,
            );
        }

        ResetReport {
            target_dir: self.target.path().to_path_buf(),
            reaper,
            purge,
            log: narrator.log,
        }
    }

    /// Looks up what a reset would act on without terminating or deleting anything.
    pub fn preview(&mut self) -> PreviewReport {
        let enumeration_available = self.reaper.enumeration_supported();
        let processes = if enumeration_available {
            self.reaper
                .matching_processes(&self.names)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "failed to enumerate processes");
                    Vec::new()
                })
        } else {
            Vec::new()
        };
        let tree = purger::measure(&self.target);

        PreviewReport {
            target_dir: self.target.path().to_path_buf(),
            enumeration_available,
            processes,
            directory_exists: tree.is_some(),
            total_bytes: tree.map_or(0, |t| t.total_bytes),
            entry_count: tree.map_or(0, |t| t.entry_count),
        }
    }
}

impl<T: ProcessTable + Send + 'static> Orchestrator<T> {
    /// Moves the reset onto a worker thread.
    ///
    /// Progress arrives through [`ResetTask::events`]; the final report through
    /// [`ResetTask::join`].
    pub fn spawn(mut self) -> Result<ResetTask> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("stopanyads-reset".to_string())
            .spawn(move || {
                self.run(|event| {
                    // the caller may stop listening early
                    tx.send(event.clone()).ok();
                })
            })?;
        Ok(ResetTask { events: rx, handle })
    }
}

/// Handle to a reset running on a worker thread.
pub struct ResetTask {
    events: Receiver<ProgressEvent>,
    handle: JoinHandle<ResetReport>,
}

impl ResetTask {
    /// Blocks for each event; ends once the worker is done.
    pub fn events(&self) -> mpsc::Iter<'_, ProgressEvent> {
        self.events.iter()
    }

    /// Events already delivered, without blocking.
    pub fn try_events(&self) -> mpsc::TryIter<'_, ProgressEvent> {
        self.events.try_iter()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> Result<ResetReport> {
        self.handle.join().map_err(|_| StopError::TaskPanicked)
    }
}
