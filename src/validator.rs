//! Validator process management: command construction, spawning, handles,
//! and termination.

pub mod command;
pub mod launcher;
pub mod process;
pub mod termination;
