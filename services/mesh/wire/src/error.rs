//! Wire protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding a datagram.
///
/// Every variant corresponds to a malformed-input case the decoder must
/// reject without panicking (truncated buffer, oversized counts, an
/// unterminated host string, ...). None of these are fatal to the calling
/// process: the receive loop drops the datagram and continues.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WireError {
    /// Buffer too short to contain the fields the type code promises.
    #[error("truncated message (need {need} bytes, have {have})")]
    Truncated {
        /// Bytes required to decode the next field.
        need: usize,
        /// Bytes actually remaining in the buffer.
        have: usize,
    },

    /// First byte did not match a known message type.
    #[error("unknown message type {0}")]
    UnknownType(u8),

    /// A length-prefixed count (N/K/M) would read past the buffer or past
    /// `BUFFER_SIZE`.
    #[error("oversized count field: {0}")]
    OversizedCount(usize),

    /// A host string's NUL terminator was never found before the buffer ended.
    #[error("unterminated host string")]
    UnterminatedHost,

    /// A host string was not valid UTF-8.
    #[error("host string is not valid utf-8")]
    InvalidUtf8,

    /// Encoded message would exceed `BUFFER_SIZE`.
    #[error("encoded message too large: {0} bytes")]
    TooLarge(usize),
}
