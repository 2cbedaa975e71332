//! Runtime glue that wires configuration, logging, failure reporting, and the
//! runner orchestration.

pub mod config;
pub mod fatal;
pub mod runner;
pub mod telemetry;
