use thiserror::Error;

use super::types::ParamKey;

/// Unrecognized parameter name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown parameter '{0}' (expected ChangeThreshold, SlowInterval, FastInterval or FastTimeout)")]
pub struct ParamKeyError(pub String);

/// Errors raised while encoding a parameter set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Value does not fit in an unsigned 16-bit field
    #[error("{key} value {value} does not fit in uint16")]
    ValueOutOfRange { key: ParamKey, value: i32 },
}

/// Errors raised while decoding a parameter buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("parameter buffer must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
