//! Restarts the validator warped to a later epoch.
//!
//! The current epoch and slot are read with two separate queries; the validator
//! may advance between them. That window is accepted imprecision: near a
//! boundary the margin check absorbs it, elsewhere it does not change the result.

use crate::orchestrator::backoff::sleep_with_cancellation;
use crate::orchestrator::readiness::{ReadinessPoller, ReadinessPolicy, ReadyValidator};
use crate::rpc::client::ClusterQuery;
use crate::runtime::config::WarpConfig;
use crate::validator::launcher::Launch;
use crate::validator::process::ValidatorProcess;
use crate::validator::termination::TerminationTarget;
use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;

/// A validator relaunched at `warp_slot` and confirmed ready.
#[derive(Debug)]
pub struct WarpedValidator<P> {
    pub process: P,
    pub ready: ReadyValidator,
    /// Epoch observed right before the restart.
    pub observed_epoch: u64,
    pub warp_slot: u64,
}

pub struct EpochAdvancer<'a, Q: ?Sized, L> {
    config: &'a WarpConfig,
    query: &'a Q,
    launcher: &'a L,
    cancellation: Option<&'a CancellationToken>,
}

impl<'a, Q, L> EpochAdvancer<'a, Q, L>
where
    Q: ClusterQuery + ?Sized,
    L: Launch,
{
    pub fn new(config: &'a WarpConfig, query: &'a Q, launcher: &'a L) -> Self {
        Self {
            config,
            query,
            launcher,
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.is_some_and(CancellationToken::is_cancelled)
    }

    /// Stops `target`, relaunches `epochs` epochs ahead and waits for readiness.
    ///
    /// Neither termination nor relaunch is retried. A cancelled readiness wait
    /// interrupts the relaunched validator before returning.
    pub async fn advance<T: ValidatorProcess>(
        &self,
        target: TerminationTarget<'_, T>,
        epochs: u64,
    ) -> Result<WarpedValidator<L::Process>> {
        if epochs == 0 {
            bail!("epochs to advance must be greater than 0");
        }

        let slots_per_epoch = self.config.slots_per_epoch();
        let margin = self.config.boundary_margin_slots();

        let mut epoch = self
            .query
            .epoch()
            .await
            .context("failed to read current epoch")?;
        let slot = self
            .query
            .slot()
            .await
            .context("failed to read current slot")?;
        tracing::info!(epoch, slot, epochs, "current cluster position");

        while within_boundary_margin(slot, epoch, epochs, slots_per_epoch, margin)? {
            tracing::info!(
                epoch,
                slot,
                "close to the epoch boundary; waiting for the validator to cross it"
            );
            sleep_with_cancellation(self.config.natural_advance_interval(), self.cancellation)
                .await?;
            epoch = self
                .query
                .epoch()
                .await
                .context("failed to re-read current epoch")?;
        }

        let warp_slot = warp_slot_for(slots_per_epoch, epoch, epochs)?;

        tracing::info!(scope = %target.describe(), "stopping validator");
        target.terminate().await?;
        sleep_with_cancellation(self.config.shutdown_grace(), self.cancellation).await?;

        tracing::info!(
            observed_epoch = epoch,
            target_epoch = epoch + epochs,
            warp_slot,
            "starting validator at warp slot"
        );
        let mut process = self
            .launcher
            .launch(Some(warp_slot))
            .context("failed to relaunch validator")?;

        let mut poller =
            ReadinessPoller::new(self.query, ReadinessPolicy::from_config(self.config));
        if let Some(token) = self.cancellation {
            poller = poller.with_cancellation(token);
        }
        let ready = match poller.wait(&mut process).await {
            Ok(ready) => ready,
            Err(err) => {
                if self.is_cancelled() {
                    if let Err(stop_err) = process.interrupt() {
                        tracing::warn!(
                            error = %stop_err,
                            "failed to stop relaunched validator after cancellation"
                        );
                    }
                }
                return Err(err.into());
            }
        };

        Ok(WarpedValidator {
            process,
            ready,
            observed_epoch: epoch,
            warp_slot,
        })
    }
}

/// First slot of epoch `epoch + epochs`.
pub fn warp_slot_for(slots_per_epoch: u64, epoch: u64, epochs: u64) -> Result<u64> {
    epoch
        .checked_add(epochs)
        .and_then(|target| target.checked_mul(slots_per_epoch))
        .with_context(|| {
            format!("warp slot overflows for epoch {epoch} + {epochs} at {slots_per_epoch} slots per epoch")
        })
}

/// True while `slot` is within `margin` slots of the boundary a restart would target.
pub fn within_boundary_margin(
    slot: u64,
    epoch: u64,
    epochs: u64,
    slots_per_epoch: u64,
    margin: u64,
) -> Result<bool> {
    let boundary = warp_slot_for(slots_per_epoch, epoch, epochs)?;
    Ok(slot >= boundary.saturating_sub(margin))
}
