//! Cluster queries issued through the `solana` command-line tool. Houses the
//! `ClusterQuery` trait consumed by the advancer and the readiness poller, and the
//! `SolanaCli` implementation that shells out for every call.

use crate::rpc::error::QueryError;
use crate::rpc::helpers::parse_integer_output;
use crate::runtime::config::WarpConfig;
use futures::future::BoxFuture;
use std::process::Stdio;
use tokio::process::Command;

pub type QueryFuture<'a> = BoxFuture<'a, Result<u64, QueryError>>;

const EPOCH_SUBCOMMAND: &str = "epoch";
const SLOT_SUBCOMMAND: &str = "slot";
const BLOCK_HEIGHT_SUBCOMMAND: &str = "block-height";

/// Read-only view of the running cluster.
///
/// Every call is independent; two calls are never atomic with respect to the
/// validator's progress.
pub trait ClusterQuery: Send + Sync {
    fn epoch(&self) -> QueryFuture<'_>;

    fn slot(&self) -> QueryFuture<'_>;

    fn block_height(&self) -> QueryFuture<'_>;
}

#[derive(Debug, Clone)]
pub struct SolanaCli {
    binary: String,
    rpc_url: Option<String>,
}

impl ClusterQuery for SolanaCli {
    fn epoch(&self) -> QueryFuture<'_> {
        Box::pin(self.query(EPOCH_SUBCOMMAND))
    }

    fn slot(&self) -> QueryFuture<'_> {
        Box::pin(self.query(SLOT_SUBCOMMAND))
    }

    fn block_height(&self) -> QueryFuture<'_> {
        Box::pin(self.query(BLOCK_HEIGHT_SUBCOMMAND))
    }
}

impl SolanaCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            rpc_url: None,
        }
    }

    pub fn from_config(config: &WarpConfig) -> Self {
        let cli = Self::new(config.cli_binary());
        match config.rpc_url() {
            Some(url) => cli.with_rpc_url(url),
            None => cli,
        }
    }

    /// Points every query at an explicit RPC endpoint instead of the CLI's configured one.
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_url.as_deref()
    }

    /// Builds the invocation for one subcommand. Stdout is captured, stderr discarded.
    pub fn command(&self, subcommand: &str) -> Command {
        let mut command = Command::new(&self.binary);
        command.arg(subcommand);
        if let Some(url) = self.rpc_url.as_deref() {
            command.arg("--url").arg(url);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }

    async fn query(&self, subcommand: &'static str) -> Result<u64, QueryError> {
        let label = format!("{} {}", self.binary, subcommand);
        let output = self
            .command(subcommand)
            .output()
            .await
            .map_err(|source| QueryError::Spawn {
                command: label.clone(),
                source,
            })?;

        if !output.status.success() {
            tracing::debug!(command = %label, status = %output.status, "cluster query failed");
            return Err(QueryError::Unavailable {
                command: label,
                status: Some(output.status),
            });
        }

        let value = parse_integer_output(&label, &output.stdout)?;
        tracing::debug!(command = %label, value, "cluster query succeeded");
        Ok(value)
    }
}
