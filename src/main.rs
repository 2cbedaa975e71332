use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use warpstart::runtime::config::{
    DEFAULT_BOUNDARY_MARGIN_SLOTS, DEFAULT_CLI_BINARY, DEFAULT_READY_POLL_ATTEMPTS,
    DEFAULT_SLOTS_PER_EPOCH, DEFAULT_VALIDATOR_BINARY,
};
use warpstart::{
    init_tracing, report_failure, ExternalValidator, Runner, TerminationTarget, WarpConfig,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Launch a local test validator for CI and warp it across epochs",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    options: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Launch a validator, wait until it produces blocks, and print its PID
    Start {
        /// Start the ledger pre-advanced to this slot
        #[arg(long)]
        warp_slot: Option<u64>,
    },
    /// Restart the running validator warped ahead by whole epochs and print the new PID
    Advance(AdvanceArgs),
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("termination")
        .required(true)
        .args(["pid", "kill_all_by_name"])
))]
struct AdvanceArgs {
    /// Number of epochs to advance
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    epochs: u64,

    /// PID of the validator to restart, as printed by `start`
    #[arg(long, env = "WARPSTART_VALIDATOR_PID")]
    pid: Option<u32>,

    /// Interrupt every process named like the validator binary, including unrelated instances
    #[arg(long)]
    kill_all_by_name: bool,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Validator program to spawn
    #[arg(long, global = true, env = "WARPSTART_VALIDATOR_BINARY", default_value = DEFAULT_VALIDATOR_BINARY)]
    validator_binary: String,

    /// CLI program used for epoch, slot and block-height queries
    #[arg(long, global = true, env = "WARPSTART_CLI_BINARY", default_value = DEFAULT_CLI_BINARY)]
    cli_binary: String,

    /// RPC endpoint passed to the CLI as --url
    #[arg(long = "url", global = true, env = "WARPSTART_RPC_URL")]
    rpc_url: Option<String>,

    /// Slots per epoch passed to the validator and used for warp-slot arithmetic
    #[arg(long, global = true, env = "WARPSTART_SLOTS_PER_EPOCH", default_value_t = DEFAULT_SLOTS_PER_EPOCH)]
    slots_per_epoch: u64,

    /// Maximum block-height queries per readiness wait
    #[arg(long, global = true, env = "WARPSTART_POLL_ATTEMPTS", default_value_t = DEFAULT_READY_POLL_ATTEMPTS)]
    poll_attempts: usize,

    /// Delay between block-height queries in milliseconds
    #[arg(long, global = true, env = "WARPSTART_POLL_INTERVAL_MS", default_value_t = 100)]
    poll_interval_ms: u64,

    /// Overall readiness budget in milliseconds (attempt bound only when unset)
    #[arg(long, global = true, env = "WARPSTART_READY_TIMEOUT_MS")]
    ready_timeout_ms: Option<u64>,

    /// Slots before an epoch boundary inside which `advance` waits instead of restarting
    #[arg(long, global = true, env = "WARPSTART_BOUNDARY_MARGIN", default_value_t = DEFAULT_BOUNDARY_MARGIN_SLOTS)]
    boundary_margin: u64,

    /// Delay between epoch re-reads while waiting out a boundary, in milliseconds
    #[arg(long, global = true, env = "WARPSTART_NATURAL_ADVANCE_MS", default_value_t = 1_000)]
    natural_advance_ms: u64,

    /// Pause between stopping the old validator and relaunching, in milliseconds
    #[arg(long, global = true, env = "WARPSTART_SHUTDOWN_GRACE_MS", default_value_t = 5_000)]
    shutdown_grace_ms: u64,
}

impl ConfigArgs {
    fn to_config(&self) -> Result<WarpConfig> {
        let mut builder = WarpConfig::builder()
            .validator_binary(self.validator_binary.clone())
            .cli_binary(self.cli_binary.clone())
            .slots_per_epoch(self.slots_per_epoch)
            .ready_poll_attempts(self.poll_attempts)
            .ready_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .boundary_margin_slots(self.boundary_margin)
            .natural_advance_interval(Duration::from_millis(self.natural_advance_ms))
            .shutdown_grace(Duration::from_millis(self.shutdown_grace_ms));

        if let Some(url) = &self.rpc_url {
            builder = builder.rpc_url(url.clone());
        }
        if let Some(timeout_ms) = self.ready_timeout_ms {
            builder = builder.ready_timeout(Duration::from_millis(timeout_ms));
        }

        builder.build()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(pid) => {
            println!("{pid}");
            ExitCode::SUCCESS
        }
        Err(err) => report_failure(&err),
    }
}

async fn run(cli: Cli) -> Result<u32> {
    let runner = Runner::new(cli.options.to_config()?);
    let ctrl_c = runner.cancel_on_ctrl_c();

    let outcome = match cli.command {
        Command::Start { warp_slot } => start(&runner, warp_slot).await,
        Command::Advance(args) => advance(&runner, args).await,
    };

    ctrl_c.abort();
    outcome
}

async fn start(runner: &Runner, warp_slot: Option<u64>) -> Result<u32> {
    let (_validator, ready) = runner.start(warp_slot).await?;
    Ok(ready.pid)
}

async fn advance(runner: &Runner, args: AdvanceArgs) -> Result<u32> {
    let warped = match args.pid {
        Some(pid) => {
            let mut previous = ExternalValidator::new(pid);
            runner
                .advance(TerminationTarget::Tracked(&mut previous), args.epochs)
                .await?
        }
        None => {
            let program = runner.config().validator_binary();
            runner
                .advance(
                    TerminationTarget::<ExternalValidator>::AllNamed(program),
                    args.epochs,
                )
                .await?
        }
    };
    Ok(warped.ready.pid)
}
