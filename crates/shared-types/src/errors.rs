//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors building a public key from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Raw key had the wrong size.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex text did not decode.
    #[error("invalid key hex: {0}")]
    InvalidHex(String),
}

/// Errors from the binary dictionary codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input ended before a value was complete.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A byte that cannot start or continue the expected value.
    #[error("unexpected byte {found:?} at offset {offset}")]
    UnexpectedByte { found: char, offset: usize },

    /// String length or integer digits were malformed.
    #[error("malformed {what} at offset {offset}")]
    Malformed { what: &'static str, offset: usize },

    /// Integer does not fit the requested type.
    #[error("integer {value} out of range")]
    IntegerOutOfRange { value: String },

    /// Consumer was asked for a value of a different kind.
    #[error("expected {expected}")]
    WrongType { expected: &'static str },

    /// Dictionary has no more entries.
    #[error("dictionary is exhausted")]
    Exhausted,
}

/// Errors reported by the underlying transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The remote did not answer within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// Listener could not bind.
    #[error("bind failed: {0}")]
    BindFailed(String),

    /// No route to the destination (unknown connection or peer).
    #[error("no route to destination: {0}")]
    NoRoute(String),

    /// The remote answered with a failure.
    #[error("remote failure: {0}")]
    Remote(String),
}
