use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_VALIDATOR_BINARY: &str = "solana-test-validator";
pub const DEFAULT_CLI_BINARY: &str = "solana";
pub const DEFAULT_SLOTS_PER_EPOCH: u64 = 1000;
pub const DEFAULT_READY_POLL_ATTEMPTS: usize = 50;
pub const DEFAULT_BOUNDARY_MARGIN_SLOTS: u64 = 10;
const DEFAULT_READY_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_NATURAL_ADVANCE_INTERVAL_SECS: u64 = 1;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Settings shared by every operation of a single run: the launcher, the epoch
/// advancer and the readiness poller all read from the same instance.
///
/// Instances are constructed via [`WarpConfig::builder`] or [`WarpConfig::new`]
/// so invariants are validated before any consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarpConfig {
    validator_binary: String,
    cli_binary: String,
    rpc_url: Option<String>,
    slots_per_epoch: u64,
    ready_poll_attempts: usize,
    ready_poll_interval: Duration,
    ready_timeout: Option<Duration>,
    boundary_margin_slots: u64,
    natural_advance_interval: Duration,
    shutdown_grace: Duration,
}

pub struct WarpConfigParams {
    pub validator_binary: String,
    pub cli_binary: String,
    pub rpc_url: Option<String>,
    pub slots_per_epoch: u64,
    pub ready_poll_attempts: usize,
    pub ready_poll_interval: Duration,
    pub ready_timeout: Option<Duration>,
    pub boundary_margin_slots: u64,
    pub natural_advance_interval: Duration,
    pub shutdown_grace: Duration,
}

impl WarpConfig {
    /// Returns a builder where every field starts at its default.
    pub fn builder() -> WarpConfigBuilder {
        WarpConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values and validates it.
    pub fn new(params: WarpConfigParams) -> Result<Self> {
        let WarpConfigParams {
            validator_binary,
            cli_binary,
            rpc_url,
            slots_per_epoch,
            ready_poll_attempts,
            ready_poll_interval,
            ready_timeout,
            boundary_margin_slots,
            natural_advance_interval,
            shutdown_grace,
        } = params;

        let config = Self {
            validator_binary: trimmed_string(validator_binary),
            cli_binary: trimmed_string(cli_binary),
            rpc_url: rpc_url.map(trimmed_string),
            slots_per_epoch,
            ready_poll_attempts,
            ready_poll_interval,
            ready_timeout,
            boundary_margin_slots,
            natural_advance_interval,
            shutdown_grace,
        };

        config.validate()?;
        Ok(config)
    }

    /// Program spawned to run the test validator.
    pub fn validator_binary(&self) -> &str {
        &self.validator_binary
    }

    /// Program invoked for `epoch`, `slot` and `block-height` queries.
    pub fn cli_binary(&self) -> &str {
        &self.cli_binary
    }

    /// Optional RPC endpoint forwarded to the CLI as `--url`.
    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_url.as_deref()
    }

    pub fn slots_per_epoch(&self) -> u64 {
        self.slots_per_epoch
    }

    /// Upper bound on `block-height` queries issued by one readiness wait.
    pub fn ready_poll_attempts(&self) -> usize {
        self.ready_poll_attempts
    }

    /// Delay between two readiness attempts.
    pub fn ready_poll_interval(&self) -> Duration {
        self.ready_poll_interval
    }

    /// Optional wall-clock budget for one readiness wait, on top of the attempt bound.
    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout
    }

    /// Slots before an epoch boundary inside which the advancer waits instead of restarting.
    pub fn boundary_margin_slots(&self) -> u64 {
        self.boundary_margin_slots
    }

    /// Delay between epoch re-reads while waiting near a boundary.
    pub fn natural_advance_interval(&self) -> Duration {
        self.natural_advance_interval
    }

    /// Time allowed for the old validator to shut down before relaunching.
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        ensure_not_empty(&self.validator_binary, "validator_binary")?;
        ensure_not_empty(&self.cli_binary, "cli_binary")?;

        if let Some(url) = self.rpc_url.as_deref() {
            validate_url(url)?;
        }

        if self.slots_per_epoch == 0 {
            bail!("slots_per_epoch must be greater than 0");
        }

        if self.ready_poll_attempts == 0 {
            bail!("ready_poll_attempts must be greater than 0");
        }

        if self.ready_poll_interval.is_zero() {
            bail!("ready_poll_interval must be greater than 0");
        }

        if matches!(self.ready_timeout, Some(timeout) if timeout.is_zero()) {
            bail!("ready_timeout must be greater than 0 when set");
        }

        if self.natural_advance_interval.is_zero() {
            bail!("natural_advance_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            validator_binary: DEFAULT_VALIDATOR_BINARY.to_owned(),
            cli_binary: DEFAULT_CLI_BINARY.to_owned(),
            rpc_url: None,
            slots_per_epoch: DEFAULT_SLOTS_PER_EPOCH,
            ready_poll_attempts: DEFAULT_READY_POLL_ATTEMPTS,
            ready_poll_interval: Duration::from_millis(DEFAULT_READY_POLL_INTERVAL_MS),
            ready_timeout: None,
            boundary_margin_slots: DEFAULT_BOUNDARY_MARGIN_SLOTS,
            natural_advance_interval: Duration::from_secs(DEFAULT_NATURAL_ADVANCE_INTERVAL_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct WarpConfigBuilder {
    validator_binary: Option<String>,
    cli_binary: Option<String>,
    rpc_url: Option<String>,
    slots_per_epoch: Option<u64>,
    ready_poll_attempts: Option<usize>,
    ready_poll_interval: Option<Duration>,
    ready_timeout: Option<Duration>,
    boundary_margin_slots: Option<u64>,
    natural_advance_interval: Option<Duration>,
    shutdown_grace: Option<Duration>,
}

impl WarpConfigBuilder {
    pub fn validator_binary(mut self, binary: impl Into<String>) -> Self {
        self.validator_binary = Some(binary.into());
        self
    }

    pub fn cli_binary(mut self, binary: impl Into<String>) -> Self {
        self.cli_binary = Some(binary.into());
        self
    }

    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn slots_per_epoch(mut self, slots: u64) -> Self {
        self.slots_per_epoch = Some(slots);
        self
    }

    pub fn ready_poll_attempts(mut self, attempts: usize) -> Self {
        self.ready_poll_attempts = Some(attempts);
        self
    }

    pub fn ready_poll_interval(mut self, interval: Duration) -> Self {
        self.ready_poll_interval = Some(interval);
        self
    }

    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = Some(timeout);
        self
    }

    pub fn boundary_margin_slots(mut self, slots: u64) -> Self {
        self.boundary_margin_slots = Some(slots);
        self
    }

    pub fn natural_advance_interval(mut self, interval: Duration) -> Self {
        self.natural_advance_interval = Some(interval);
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = Some(grace);
        self
    }

    pub fn build(self) -> Result<WarpConfig> {
        let defaults = WarpConfig::default();
        let params = WarpConfigParams {
            validator_binary: self.validator_binary.unwrap_or(defaults.validator_binary),
            cli_binary: self.cli_binary.unwrap_or(defaults.cli_binary),
            rpc_url: self.rpc_url,
            slots_per_epoch: self.slots_per_epoch.unwrap_or(defaults.slots_per_epoch),
            ready_poll_attempts: self
                .ready_poll_attempts
                .unwrap_or(defaults.ready_poll_attempts),
            ready_poll_interval: self
                .ready_poll_interval
                .unwrap_or(defaults.ready_poll_interval),
            ready_timeout: self.ready_timeout,
            boundary_margin_slots: self
                .boundary_margin_slots
                .unwrap_or(defaults.boundary_margin_slots),
            natural_advance_interval: self
                .natural_advance_interval
                .unwrap_or(defaults.natural_advance_interval),
            shutdown_grace: self.shutdown_grace.unwrap_or(defaults.shutdown_grace),
        };

        WarpConfig::new(params)
    }
}

fn trimmed_string(value: String) -> String {
    value.trim().to_owned()
}

fn ensure_not_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{field} cannot be empty");
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("rpc_url must start with http:// or https://");
    }
    Ok(())
}
