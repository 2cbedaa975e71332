use crate::orchestrator::advancer::{EpochAdvancer, WarpedValidator};
use crate::orchestrator::readiness::{ReadinessPoller, ReadinessPolicy, ReadyValidator};
use crate::rpc::client::{ClusterQuery, SolanaCli};
use crate::runtime::config::WarpConfig;
use crate::validator::launcher::{Launch, ValidatorLauncher};
use crate::validator::process::ValidatorProcess;
use crate::validator::termination::TerminationTarget;
use anyhow::{Context, Result};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wires one configuration to a cluster query client and a launcher, and owns the
/// cancellation token every wait in the run observes.
pub struct Runner<Q = SolanaCli, L = ValidatorLauncher> {
    config: WarpConfig,
    query: Q,
    launcher: L,
    shutdown: CancellationToken,
}

impl Runner {
    /// Builds a runner that shells out to the binaries named in `config`.
    pub fn new(config: WarpConfig) -> Self {
        let query = SolanaCli::from_config(&config);
        let launcher = ValidatorLauncher::from_config(&config);
        Self::with_parts(config, query, launcher)
    }
}

impl<Q: ClusterQuery, L: Launch> Runner<Q, L> {
    pub fn with_parts(config: WarpConfig, query: Q, launcher: L) -> Self {
        Self {
            config,
            query,
            launcher,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &WarpConfig {
        &self.config
    }

    /// Returns a clone of the root token so callers can integrate their own
    /// cancellation strategies.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancels the run on the first Ctrl-C (SIGINT).
    pub fn cancel_on_ctrl_c(&self) -> JoinHandle<()> {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = signal::ctrl_c() => {
                    match result {
                        Ok(()) => {
                            tracing::info!("Ctrl-C received; cancelling run");
                            shutdown.cancel();
                        }
                        Err(err) => tracing::warn!(error = %err, "failed to listen for Ctrl-C"),
                    }
                }
                _ = shutdown.cancelled() => {}
            }
        })
    }

    /// Launches a validator (optionally warped) and waits until it produces blocks.
    ///
    /// If the wait is cancelled the freshly spawned validator is interrupted before
    /// returning; on any other failure it is left as is.
    pub async fn start(&self, warp_slot: Option<u64>) -> Result<(L::Process, ReadyValidator)> {
        let mut process = self
            .launcher
            .launch(warp_slot)
            .context("failed to launch validator")?;

        let outcome = ReadinessPoller::new(&self.query, ReadinessPolicy::from_config(&self.config))
            .with_cancellation(&self.shutdown)
            .wait(&mut process)
            .await;

        match outcome {
            Ok(ready) => Ok((process, ready)),
            Err(err) => {
                if self.shutdown.is_cancelled() {
                    if let Err(stop_err) = process.interrupt() {
                        tracing::warn!(error = %stop_err, "failed to stop validator after cancellation");
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Stops `target` and relaunches the validator `epochs` epochs ahead.
    pub async fn advance<T: ValidatorProcess>(
        &self,
        target: TerminationTarget<'_, T>,
        epochs: u64,
    ) -> Result<WarpedValidator<L::Process>> {
        EpochAdvancer::new(&self.config, &self.query, &self.launcher)
            .with_cancellation(&self.shutdown)
            .advance(target, epochs)
            .await
    }
}
