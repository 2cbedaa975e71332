//! Parsing helpers for the single-integer output printed by `solana epoch`,
//! `solana slot` and `solana block-height`.

use crate::rpc::error::QueryError;

/// Parses CLI stdout into an integer.
///
/// Surrounding whitespace (including the trailing newline) is ignored. Anything else
/// yields [`QueryError::Parse`] carrying the lossy-decoded output.
pub fn parse_integer_output(command: &str, stdout: &[u8]) -> Result<u64, QueryError> {
    let text = String::from_utf8_lossy(stdout);
    text.trim().parse::<u64>().map_err(|_| QueryError::Parse {
        command: command.to_owned(),
        output: text.trim().to_owned(),
    })
}
