use std::ffi::OsString;

/// Argument list for one `solana-test-validator` launch.
///
/// Kept free of process state so the exact invocation can be inspected before
/// (or without) spawning anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorCommand {
    program: String,
    slots_per_epoch: u64,
    warp_slot: Option<u64>,
}

impl ValidatorCommand {
    pub fn new(program: impl Into<String>, slots_per_epoch: u64) -> Self {
        Self {
            program: program.into(),
            slots_per_epoch,
            warp_slot: None,
        }
    }

    pub fn with_warp_slot(mut self, warp_slot: Option<u64>) -> Self {
        self.warp_slot = warp_slot;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn warp_slot(&self) -> Option<u64> {
        self.warp_slot
    }

    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--slots-per-epoch".into(),
            self.slots_per_epoch.to_string().into(),
        ];
        if let Some(slot) = self.warp_slot {
            args.push("--warp-slot".into());
            args.push(slot.to_string().into());
        }
        args
    }
}
