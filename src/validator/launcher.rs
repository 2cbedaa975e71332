use crate::runtime::config::WarpConfig;
use crate::validator::command::ValidatorCommand;
use crate::validator::process::{ValidatorChild, ValidatorProcess};
use anyhow::{anyhow, Context, Result};
use std::process::Stdio;
use tokio::process::Command;

/// Starts validator processes. Implementations must not block on the child.
pub trait Launch: Send + Sync {
    type Process: ValidatorProcess;

    fn launch(&self, warp_slot: Option<u64>) -> Result<Self::Process>;
}

/// Spawns the configured `solana-test-validator` binary.
#[derive(Debug, Clone)]
pub struct ValidatorLauncher {
    program: String,
    slots_per_epoch: u64,
}

impl ValidatorLauncher {
    pub fn new(program: impl Into<String>, slots_per_epoch: u64) -> Self {
        Self {
            program: program.into(),
            slots_per_epoch,
        }
    }

    pub fn from_config(config: &WarpConfig) -> Self {
        Self::new(config.validator_binary(), config.slots_per_epoch())
    }

    pub fn command(&self, warp_slot: Option<u64>) -> ValidatorCommand {
        ValidatorCommand::new(self.program.clone(), self.slots_per_epoch).with_warp_slot(warp_slot)
    }
}

impl Launch for ValidatorLauncher {
    type Process = ValidatorChild;

    fn launch(&self, warp_slot: Option<u64>) -> Result<ValidatorChild> {
        let invocation = self.command(warp_slot);
        if let Some(slot) = warp_slot {
            tracing::info!(warp_slot = slot, "advancing validator to slot");
        }

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(false);

        let child = command
            .spawn()
            .with_context(|| format!("failed to start {}", invocation.program()))?;
        let pid = child
            .id()
            .ok_or_else(|| anyhow!("{} exited before reporting a pid", invocation.program()))?;

        tracing::info!(
            pid,
            program = invocation.program(),
            slots_per_epoch = self.slots_per_epoch,
            warp_slot = ?warp_slot,
            "validator process spawned"
        );

        Ok(ValidatorChild::new(child, pid))
    }
}
