//! Handles to validator processes: the ones this crate spawned and the ones a
//! previous invocation left running.

use anyhow::{Context, Result};
use std::io;
use std::process::ExitStatus;
use tokio::process::Child;

/// A validator process the orchestrator can observe and stop.
pub trait ValidatorProcess: Send {
    /// OS process identifier.
    fn id(&self) -> u32;

    /// Non-blocking liveness check.
    fn has_exited(&mut self) -> Result<bool>;

    /// Sends SIGINT to this process only. A process that is already gone is not an error.
    fn interrupt(&mut self) -> Result<()>;
}

/// A validator spawned by this crate. Dropping the handle leaves the process running.
#[derive(Debug)]
pub struct ValidatorChild {
    child: Child,
    pid: u32,
}

impl ValidatorChild {
    pub(crate) fn new(child: Child, pid: u32) -> Self {
        Self { child, pid }
    }

    /// Waits for the process to exit and returns its status.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        self.child
            .wait()
            .await
            .with_context(|| format!("failed to wait for validator {}", self.pid))
    }
}

impl ValidatorProcess for ValidatorChild {
    fn id(&self) -> u32 {
        self.pid
    }

    fn has_exited(&mut self) -> Result<bool> {
        let status = self
            .child
            .try_wait()
            .with_context(|| format!("failed to poll validator {} status", self.pid))?;
        Ok(status.is_some())
    }

    fn interrupt(&mut self) -> Result<()> {
        if self.has_exited()? {
            return Ok(());
        }
        interrupt_pid(self.pid)
    }
}

/// A validator identified only by PID, typically printed by an earlier `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalValidator {
    pid: u32,
}

impl ExternalValidator {
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }
}

impl ValidatorProcess for ExternalValidator {
    fn id(&self) -> u32 {
        self.pid
    }

    fn has_exited(&mut self) -> Result<bool> {
        // Signal 0 only probes for existence; EPERM still means the PID is live.
        match send_signal(self.pid, 0) {
            Ok(()) => Ok(false),
            Err(err) if err.raw_os_error() == Some(libc::ESRCH) => Ok(true),
            Err(err) if err.raw_os_error() == Some(libc::EPERM) => Ok(false),
            Err(err) => Err(err).with_context(|| format!("failed to probe process {}", self.pid)),
        }
    }

    fn interrupt(&mut self) -> Result<()> {
        interrupt_pid(self.pid)
    }
}

fn interrupt_pid(pid: u32) -> Result<()> {
    match send_signal(pid, libc::SIGINT) {
        Ok(()) => {
            tracing::info!(pid, "sent SIGINT to validator");
            Ok(())
        }
        Err(err) if err.raw_os_error() == Some(libc::ESRCH) => {
            tracing::info!(pid, "validator already exited");
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("failed to send SIGINT to process {pid}")),
    }
}

fn send_signal(pid: u32, signal: libc::c_int) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    if pid <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "refusing to signal a process group",
        ));
    }

    let result = unsafe { libc::kill(pid, signal) };
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
