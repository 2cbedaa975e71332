use std::fmt;
use std::io;
use std::process::ExitStatus;

/// Failure of a single CLI query.
///
/// Only [`QueryError::Unavailable`] is recoverable: the readiness poller treats it as
/// "RPC not up yet". Every other variant aborts the run.
#[derive(Debug)]
pub enum QueryError {
    /// The CLI ran but exited unsuccessfully.
    Unavailable {
        command: String,
        status: Option<ExitStatus>,
    },
    /// The CLI could not be started at all.
    Spawn { command: String, source: io::Error },
    /// The CLI succeeded but did not print an integer.
    Parse { command: String, output: String },
}

impl QueryError {
    pub fn unavailable(command: impl Into<String>) -> Self {
        Self::Unavailable {
            command: command.into(),
            status: None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn command(&self) -> &str {
        match self {
            Self::Unavailable { command, .. }
            | Self::Spawn { command, .. }
            | Self::Parse { command, .. } => command,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable {
                command,
                status: Some(status),
            } => write!(f, "`{command}` exited with {status}"),
            Self::Unavailable {
                command,
                status: None,
            } => write!(f, "`{command}` exited unsuccessfully"),
            Self::Spawn { command, source } => write!(f, "failed to run `{command}`: {source}"),
            Self::Parse { command, output } => {
                write!(f, "`{command}` printed {output:?}, expected an integer")
            }
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}
