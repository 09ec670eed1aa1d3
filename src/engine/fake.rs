//! Scripted process table for tests.

use crate::engine::reaper::{ProcessEntry, ProcessTable};
use crate::error::{Result, StopError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    ExitsOnTerminate,
    IgnoresTerminate,
    DeniesAccess,
    /// Already gone by the time the first signal arrives.
    VanishesOnSignal,
}

#[derive(Debug)]
struct FakeProcess {
    pid: u32,
    name: String,
    alive: bool,
    behaviour: Behaviour,
}

#[derive(Debug)]
pub struct FakeTable {
    supported: bool,
    snapshot_fails: bool,
    processes: Vec<FakeProcess>,
    pub terminate_calls: Vec<u32>,
    pub kill_calls: Vec<u32>,
    pub killed_by_name: Vec<String>,
}

impl FakeTable {
    pub fn new() -> Self {
        Self {
            supported: true,
            snapshot_fails: false,
            processes: Vec::new(),
            terminate_calls: Vec::new(),
            kill_calls: Vec::new(),
            killed_by_name: Vec::new(),
        }
    }

    pub fn with_process(mut self, pid: u32, name: &str, behaviour: Behaviour) -> Self {
        self.processes.push(FakeProcess {
            pid,
            name: name.to_string(),
            alive: true,
            behaviour,
        });
        self
    }

    pub fn without_enumeration(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn failing_snapshot(mut self) -> Self {
        self.snapshot_fails = true;
        self
    }

    pub fn is_running(&self, pid: u32) -> bool {
        self.processes.iter().any(|p| p.pid == pid && p.alive)
    }

    fn find(&mut self, pid: u32) -> Result<&mut FakeProcess> {
        self.processes
            .iter_mut()
            .find(|p| p.pid == pid && p.alive)
            .ok_or(StopError::ProcessNotFound(pid))
    }
}

impl ProcessTable for FakeTable {
    fn enumeration_supported(&self) -> bool {
        self.supported
    }

    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>> {
        if self.snapshot_fails {
            return Err(StopError::EnumerationUnavailable);
        }
        Ok(self
            .processes
            .iter()
            .filter(|p| p.alive)
            .map(|p| ProcessEntry {
                pid: p.pid,
                name: p.name.clone(),
            })
            .collect())
    }

    fn terminate(&mut self, pid: u32) -> Result<()> {
        self.terminate_calls.push(pid);
        let proc = self.find(pid)?;
        match proc.behaviour {
            Behaviour::ExitsOnTerminate => {
                proc.alive = false;
                Ok(())
            }
            Behaviour::IgnoresTerminate => Ok(()),
            Behaviour::DeniesAccess => Err(StopError::AccessDenied(pid)),
            Behaviour::VanishesOnSignal => {
                proc.alive = false;
                Err(StopError::ProcessNotFound(pid))
            }
        }
    }

    fn kill(&mut self, pid: u32) -> Result<()> {
        self.kill_calls.push(pid);
        let proc = self.find(pid)?;
        match proc.behaviour {
            Behaviour::DeniesAccess => Err(StopError::AccessDenied(pid)),
            Behaviour::VanishesOnSignal => {
                proc.alive = false;
                Err(StopError::ProcessNotFound(pid))
            }
            _ => {
                proc.alive = false;
                Ok(())
            }
        }
    }

    fn is_alive(&mut self, pid: u32) -> bool {
        self.is_running(pid)
    }

    fn kill_by_name(&mut self, name: &str) -> Result<()> {
        self.killed_by_name.push(name.to_string());
        for proc in self.processes.iter_mut().filter(|p| p.name == name) {
            proc.alive = false;
        }
        Ok(())
    }
}
