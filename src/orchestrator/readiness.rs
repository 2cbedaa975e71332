//! Waits for a freshly launched validator to answer `block-height` and to make
//! visible progress, then decides between "ready", "process gone" and
//! "not responding".

use crate::orchestrator::backoff::{sleep_with_cancellation, Cancelled};
use crate::rpc::client::ClusterQuery;
use crate::rpc::error::QueryError;
use crate::runtime::config::WarpConfig;
use crate::validator::process::ValidatorProcess;
use anyhow::Error as AnyError;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Outcome of a successful readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyValidator {
    pub pid: u32,
    /// Last block height reported by the CLI.
    pub block_height: u64,
    /// Whether a strictly increasing height was observed before the loop ended.
    pub progressed: bool,
    pub attempts: usize,
}

#[derive(Debug)]
pub enum ReadinessError {
    /// RPC answered, but the tracked process is no longer running. Usually another
    /// validator already owned the RPC port.
    ProcessGone { pid: u32, block_height: u64 },
    /// No `block-height` query succeeded within the polling budget.
    NotResponding { attempts: usize },
    Query(QueryError),
    Process(AnyError),
    Cancelled,
}

impl fmt::Display for ReadinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProcessGone { .. } => f.write_str(
                "RPC is online, but the process is gone ... was a validator already running?",
            ),
            Self::NotResponding { .. } => {
                f.write_str("Test validator is still not responding, something is wrong.")
            }
            Self::Query(err) => write!(f, "block height query failed: {err}"),
            Self::Process(err) => write!(f, "failed to check validator process: {err}"),
            Self::Cancelled => f.write_str("readiness wait cancelled"),
        }
    }
}

impl std::error::Error for ReadinessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Query(err) => Some(err),
            Self::Process(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<Cancelled> for ReadinessError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Polling budget for one readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub attempts: usize,
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl ReadinessPolicy {
    pub fn from_config(config: &WarpConfig) -> Self {
        Self {
            attempts: config.ready_poll_attempts(),
            interval: config.ready_poll_interval(),
            timeout: config.ready_timeout(),
        }
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::from_config(&WarpConfig::default())
    }
}

pub struct ReadinessPoller<'a, Q: ?Sized> {
    query: &'a Q,
    policy: ReadinessPolicy,
    cancellation: Option<&'a CancellationToken>,
}

impl<'a, Q: ClusterQuery + ?Sized> ReadinessPoller<'a, Q> {
    pub fn new(query: &'a Q, policy: ReadinessPolicy) -> Self {
        Self {
            query,
            policy,
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub async fn wait<P: ValidatorProcess + ?Sized>(
        &self,
        process: &mut P,
    ) -> Result<ReadyValidator, ReadinessError> {
        let started = Instant::now();
        let mut last_observed: Option<u64> = None;
        let mut progressed = false;
        let mut attempts = 0;

        while attempts < self.policy.attempts {
            if let Some(timeout) = self.policy.timeout {
                if started.elapsed() >= timeout {
                    tracing::debug!(attempts, ?timeout, "readiness timeout elapsed");
                    break;
                }
            }

            attempts += 1;
            match self.query.block_height().await {
                Ok(height) => {
                    tracing::debug!(attempt = attempts, block_height = height, "observed block height");
                    progressed = matches!(last_observed, Some(previous) if height > previous);
                    last_observed = Some(height);
                    if progressed {
                        break;
                    }
                }
                Err(err) if err.is_unavailable() => {
                    tracing::debug!(attempt = attempts, error = %err, "block height not available yet");
                }
                Err(err) => return Err(ReadinessError::Query(err)),
            }

            if attempts < self.policy.attempts {
                sleep_with_cancellation(self.policy.interval, self.cancellation).await?;
            }
        }

        let Some(block_height) = last_observed else {
            return Err(ReadinessError::NotResponding { attempts });
        };

        let pid = process.id();
        if process.has_exited().map_err(ReadinessError::Process)? {
            return Err(ReadinessError::ProcessGone { pid, block_height });
        }

        if progressed {
            tracing::info!(pid, block_height, attempts, "validator is producing blocks");
        } else {
            tracing::warn!(
                pid,
                block_height,
                attempts,
                "validator RPC is online but block height did not advance"
            );
        }

        Ok(ReadyValidator {
            pid,
            block_height,
            progressed,
            attempts,
        })
    }
}

/// Runs one readiness wait with the polling budget from `config`.
pub async fn wait_for_validator<Q, P>(
    query: &Q,
    process: &mut P,
    config: &WarpConfig,
) -> Result<ReadyValidator, ReadinessError>
where
    Q: ClusterQuery + ?Sized,
    P: ValidatorProcess + ?Sized,
{
    ReadinessPoller::new(query, ReadinessPolicy::from_config(config))
        .wait(process)
        .await
}
