use crate::validator::process::ValidatorProcess;
use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::process::Command;

const KILLALL_PROGRAM: &str = "killall";

/// Which validator(s) the epoch advancer stops before relaunching.
pub enum TerminationTarget<'a, P: ValidatorProcess> {
    /// SIGINT to the tracked process only.
    Tracked(&'a mut P),
    /// Escape hatch: `killall -INT <program>`. Every matching process on the host
    /// is interrupted, including instances this run does not own.
    AllNamed(&'a str),
}

impl<'a, P: ValidatorProcess> TerminationTarget<'a, P> {
    pub async fn terminate(self) -> Result<()> {
        match self {
            Self::Tracked(process) => {
                let pid = process.id();
                process
                    .interrupt()
                    .with_context(|| format!("failed to stop validator {pid}"))
            }
            Self::AllNamed(program) => kill_all_named(KILLALL_PROGRAM, program).await,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Tracked(process) => format!("pid {}", process.id()),
            Self::AllNamed(program) => format!("every process named {program}"),
        }
    }
}

pub fn kill_all_command(program: &str) -> Command {
    kill_all_command_with(KILLALL_PROGRAM, program)
}

fn kill_all_command_with(killall: &str, program: &str) -> Command {
    let mut command = Command::new(killall);
    command
        .arg("-INT")
        .arg(program)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

pub(crate) async fn kill_all_named(killall: &str, program: &str) -> Result<()> {
    tracing::warn!(
        program,
        "interrupting every process with this name; unrelated instances on this host are affected"
    );
    let status = kill_all_command_with(killall, program)
        .status()
        .await
        .with_context(|| format!("failed to run {killall} -INT {program}"))?;
    if !status.success() {
        // killall exits non-zero when nothing matched.
        tracing::warn!(program, %status, "{killall} reported no matching process");
    }
    Ok(())
}
