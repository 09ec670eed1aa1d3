//! Process termination: graceful request, bounded wait, forced kill.

use crate::error::{Result, StopError};
use crate::target::ProcessNameSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessStatus, Signal, System};
use tracing::{debug, warn};

/// How long terminated processes get to exit before they are killed.
pub const TERMINATE_TIMEOUT: Duration = Duration::from_secs(3);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaperResult {
    pub terminated_count: usize,
    pub error_count: usize,
    /// Set when the OS kill-by-name command was used instead of enumeration.
    /// `terminated_count` is always 0 in that mode because the real count is unknown.
    pub used_fallback_kill: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

/// Access to the host's process table.
pub trait ProcessTable {
    /// Whether processes can be enumerated on this host at all.
    fn enumeration_supported(&self) -> bool;

    /// All running processes. Processes whose metadata cannot be read are left out.
    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>>;

    /// Ask a process to exit.
    fn terminate(&mut self, pid: u32) -> Result<()>;

    /// Kill a process unconditionally.
    fn kill(&mut self, pid: u32) -> Result<()>;

    fn is_alive(&mut self, pid: u32) -> bool;

    /// Kill every process with the given executable name through the OS command.
    fn kill_by_name(&mut self, name: &str) -> Result<()>;
}

/// [`ProcessTable`] backed by `sysinfo`.
pub struct SystemProcessTable {
    sys: System,
}

impl SystemProcessTable {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }

    fn signal(&mut self, pid: u32, graceful: bool) -> Result<()> {
        let sys_pid = Pid::from_u32(pid);
        if !self.sys.refresh_process(sys_pid) {
            return Err(StopError::ProcessNotFound(pid));
        }
        let process = self
            .sys
            .process(sys_pid)
            .ok_or(StopError::ProcessNotFound(pid))?;

        let delivered = if graceful {
            // Windows has no SIGTERM; sysinfo returns None and we terminate outright.
            process.kill_with(Signal::Term).unwrap_or_else(|| process.kill())
        } else {
            process.kill()
        };

        if delivered {
            Ok(())
        } else if self.sys.refresh_process(sys_pid) {
            Err(StopError::AccessDenied(pid))
        } else {
            Err(StopError::ProcessNotFound(pid))
        }
    }
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SystemProcessTable {
    fn enumeration_supported(&self) -> bool {
        sysinfo::IS_SUPPORTED_SYSTEM
    }

    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>> {
        if !self.enumeration_supported() {
            return Err(StopError::EnumerationUnavailable);
        }
        self.sys.refresh_processes();
        let processes = self.sys.processes();

        // Linux lists every thread as its own entry; keep only thread-group leaders.
        let mut threads = HashSet::new();
        for (pid, process) in processes {
            if let Some(tasks) = process.tasks() {
                threads.extend(tasks.iter().copied().filter(|task| task != pid));
            }
        }

        Ok(processes
            .iter()
            .filter(|(pid, _)| !threads.contains(*pid))
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name().to_string(),
            })
            .collect())
    }

    fn terminate(&mut self, pid: u32) -> Result<()> {
        self.signal(pid, true)
    }

    fn kill(&mut self, pid: u32) -> Result<()> {
        self.signal(pid, false)
    }

    fn is_alive(&mut self, pid: u32) -> bool {
        let sys_pid = Pid::from_u32(pid);
        self.sys.refresh_process(sys_pid)
            && self.sys.process(sys_pid).map_or(false, |p| {
                !matches!(p.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
            })
    }

    fn kill_by_name(&mut self, name: &str) -> Result<()> {
        let mut command = kill_by_name_command(name);
        let program = command.get_program().to_string_lossy().into_owned();
        // Exit status is ignored: "no such process" is a normal outcome here.
        command
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| debug!(process = name, %status, "kill-by-name finished"))
            .map_err(|source| StopError::CommandFailed {
                command: program,
                source,
            })
    }
}

#[cfg(windows)]
fn kill_by_name_command(name: &str) -> Command {
    let mut command = Command::new("taskkill");
    command.args(["/IM", name, "/F"]);
    command
}

#[cfg(not(windows))]
fn kill_by_name_command(name: &str) -> Command {
    let mut command = Command::new("pkill");
    command.args(["-KILL", "-x", name]);
    command
}

/// Stops every process matching a [`ProcessNameSet`].
pub struct ProcessReaper<T> {
    table: T,
    timeout: Duration,
    poll_interval: Duration,
}

impl ProcessReaper<SystemProcessTable> {
    pub fn system() -> Self {
        Self::new(SystemProcessTable::new())
    }
}

impl<T: ProcessTable> ProcessReaper<T> {
    pub fn new(table: T) -> Self {
        Self {
            table,
            timeout: TERMINATE_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn enumeration_supported(&self) -> bool {
        self.table.enumeration_supported()
    }

    pub fn matching_processes(&mut self, names: &ProcessNameSet) -> Result<Vec<ProcessEntry>> {
        Ok(self
            .table
            .snapshot()?
            .into_iter()
            .filter(|p| names.matches(&p.name))
            .collect())
    }

    /// Terminates all matching processes, killing those that outlive the timeout.
    ///
    /// Never fails: per-process and system errors are counted in the result.
    pub fn reap(&mut self, names: &ProcessNameSet) -> ReaperResult {
        if !self.table.enumeration_supported() {
            return self.fallback_kill(names);
        }

        let mut result = ReaperResult::default();

        let targets = match self.matching_processes(names) {
            Ok(targets) => targets,
            Err(e) => {
                warn!(error = %e, "failed to enumerate processes");
                result.error_count += 1;
                return result;
            }
        };

        if targets.is_empty() {
            debug!("no matching processes running");
            return result;
        }

        for proc in &targets {
            match self.table.terminate(proc.pid) {
                Ok(()) => debug!(pid = proc.pid, process = %proc.name, "terminate requested"),
                Err(e) => {
                    warn!(pid = proc.pid, process = %proc.name, error = %e, "terminate failed");
                    result.error_count += 1;
                }
            }
        }

        let (gone, alive) = self.wait_for_exit(&targets);
        result.terminated_count = gone.len();

        for proc in alive {
            match self.table.kill(proc.pid) {
                Ok(()) => {
                    debug!(pid = proc.pid, process = %proc.name, "killed after timeout");
                    result.terminated_count += 1;
                }
                Err(StopError::ProcessNotFound(pid)) => {
                    // exited between the last poll and the kill
                    debug!(pid, "process vanished before kill");
                    result.terminated_count += 1;
                    result.error_count += 1;
                }
                Err(e) => {
                    warn!(pid = proc.pid, process = %proc.name, error = %e, "kill failed");
                    result.error_count += 1;
                }
            }
        }

        result
    }

    /// Polls until every target has exited or the timeout elapses.
    /// Returns `(gone, alive)`.
    fn wait_for_exit<'a>(
        &mut self,
        targets: &'a [ProcessEntry],
    ) -> (Vec<&'a ProcessEntry>, Vec<&'a ProcessEntry>) {
        let deadline = Instant::now() + self.timeout;
        let mut gone = Vec::new();
        let mut alive: Vec<&ProcessEntry> = targets.iter().collect();

        loop {
            let (exited, running): (Vec<_>, Vec<_>) = alive
                .into_iter()
                .partition(|p| !self.table.is_alive(p.pid));
            gone.extend(exited);
            alive = running;

            let now = Instant::now();
            if alive.is_empty() || now >= deadline {
                break;
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }

        (gone, alive)
    }

    fn fallback_kill(&mut self, names: &ProcessNameSet) -> ReaperResult {
        warn!("process enumeration unavailable, falling back to kill-by-name");
        let mut result = ReaperResult {
            used_fallback_kill: true,
            ..Default::default()
        };
        for name in names.iter() {
            if let Err(e) = self.table.kill_by_name(name) {
                warn!(process = name, error = %e, "kill-by-name failed");
                result.error_count += 1;
            }
        }
        result
    }
}
