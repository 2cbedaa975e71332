//! Control flow around the validator: the epoch advancer, the readiness
//! poller, and the cancellable waits they share.

pub mod advancer;
pub mod backoff;
pub mod readiness;
