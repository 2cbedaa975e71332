//! Shell-script stand-ins for `solana` and `solana-test-validator`.
//!
//! The scripts are written once into a shared directory and hard-linked into each
//! test's own directory, so no test ever executes a file another thread still
//! holds open for writing (ETXTBSY). Each link keeps its state next to itself.

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use tempfile::TempDir;
use warpstart::{WarpConfig, WarpConfigBuilder};

const SOLANA_SCRIPT: &str = r#"#!/bin/sh
dir=$(dirname "$0")
case "$*" in
  *block-height*)
    if [ -f "$dir/offline" ]; then
      exit 1
    fi
    n=$(cat "$dir/height" 2>/dev/null || echo 0)
    n=$((n + 1))
    echo "$n" > "$dir/height"
    echo "$n"
    ;;
  *epoch*)
    cat "$dir/epoch" 2>/dev/null || echo 0
    ;;
  *slot*)
    cat "$dir/slot" 2>/dev/null || echo 0
    ;;
  *)
    exit 2
    ;;
esac
"#;

const VALIDATOR_SCRIPT: &str = r#"#!/bin/sh
dir=$(dirname "$0")
echo "$*" >> "$dir/launches"
if [ -f "$dir/exit-immediately" ]; then
  exit 0
fi
exec sleep 30
"#;

struct MasterScripts {
    _dir: TempDir,
    solana: PathBuf,
    validator: PathBuf,
}

static MASTER_SCRIPTS: Lazy<MasterScripts> = Lazy::new(|| {
    let dir = tempfile::tempdir().expect("create script dir");
    let solana = write_executable(dir.path(), "solana", SOLANA_SCRIPT).expect("write solana");
    let validator = write_executable(dir.path(), "solana-test-validator", VALIDATOR_SCRIPT)
        .expect("write validator");
    MasterScripts {
        _dir: dir,
        solana,
        validator,
    }
});

fn write_executable(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    let mut permissions = fs::metadata(&path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions)?;
    Ok(path)
}

/// A private directory holding linked copies of both scripts and their state files.
pub struct ScriptedCluster {
    dir: TempDir,
    solana: PathBuf,
    validator: PathBuf,
}

impl ScriptedCluster {
    pub fn new() -> Result<Self> {
        let master = &*MASTER_SCRIPTS;
        let dir = tempfile::tempdir().context("create scripted cluster dir")?;
        let solana = dir.path().join("solana");
        let validator = dir.path().join("solana-test-validator");
        fs::hard_link(&master.solana, &solana).context("link solana script")?;
        fs::hard_link(&master.validator, &validator).context("link validator script")?;
        Ok(Self {
            dir,
            solana,
            validator,
        })
    }

    /// Builder preloaded with the script paths and fast polling.
    pub fn config_builder(&self) -> WarpConfigBuilder {
        WarpConfig::builder()
            .cli_binary(self.solana.to_string_lossy())
            .validator_binary(self.validator.to_string_lossy())
            .ready_poll_interval(Duration::from_millis(10))
            .natural_advance_interval(Duration::from_millis(10))
            .shutdown_grace(Duration::from_millis(10))
    }

    pub fn config(&self) -> WarpConfig {
        self.config_builder().build().expect("scripted config")
    }

    pub fn set_position(&self, epoch: u64, slot: u64) -> Result<()> {
        fs::write(self.dir.path().join("epoch"), format!("{epoch}\n"))?;
        fs::write(self.dir.path().join("slot"), format!("{slot}\n"))?;
        Ok(())
    }

    pub fn set_offline(&self) -> Result<()> {
        fs::write(self.dir.path().join("offline"), b"")?;
        Ok(())
    }

    pub fn make_validator_exit_immediately(&self) -> Result<()> {
        fs::write(self.dir.path().join("exit-immediately"), b"")?;
        Ok(())
    }

    /// Argument lines the validator script was started with, oldest first.
    pub fn launches(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("launches"))
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Waits until the validator script has recorded at least `count` launches.
    pub async fn wait_for_launches(&self, count: usize) -> Result<Vec<String>> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let launches = self.launches();
            if launches.len() >= count {
                return Ok(launches);
            }
            if tokio::time::Instant::now() > deadline {
                bail!("expected {count} validator launches, saw {launches:?}");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
