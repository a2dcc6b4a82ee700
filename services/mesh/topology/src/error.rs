//! Config-file parsing errors.

use thiserror::Error;

/// Errors from loading a topology template config file.
///
/// All variants are fatal at startup: a malformed config file means the
/// process should exit rather than run with a partial or guessed topology.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The first line was not a valid decimal switch count.
    #[error("first line is not a valid switch count: {0:?}")]
    ParseN(String),

    /// An edge line did not parse as `a b c` decimal integers.
    #[error("malformed edge line {line}")]
    ParseEdge {
        /// 1-based line number within the config file.
        line: usize,
    },

    /// An edge referenced a switch id outside `0..N`.
    #[error("switch id out of range 0..{n}: {id}")]
    SwitchIdOutOfRange {
        /// The offending id.
        id: i32,
        /// The declared switch count.
        n: i32,
    },

    /// An edge cost was non-positive or reached `UNREACHABLE_DISTANCE`.
    #[error("edge cost out of range (must be 1..9999): {0}")]
    CostOutOfRange(i32),

    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}
