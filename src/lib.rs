pub mod orchestrator;
pub mod rpc;
pub mod runtime;
pub mod validator;

pub use orchestrator::advancer::{EpochAdvancer, WarpedValidator};
pub use orchestrator::backoff::Cancelled;
pub use orchestrator::readiness::{
    wait_for_validator, ReadinessError, ReadinessPoller, ReadinessPolicy, ReadyValidator,
};
pub use rpc::{ClusterQuery, QueryError, QueryFuture, SolanaCli};
pub use runtime::config::{WarpConfig, WarpConfigBuilder, WarpConfigParams};
pub use runtime::fatal::{report_failure, FailureKind, FAILURE_EXIT_CODE};
pub use runtime::runner::Runner;
pub use runtime::telemetry::init_tracing;
pub use validator::command::ValidatorCommand;
pub use validator::launcher::{Launch, ValidatorLauncher};
pub use validator::process::{ExternalValidator, ValidatorChild, ValidatorProcess};
pub use validator::termination::TerminationTarget;
