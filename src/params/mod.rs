//! Tunable Mixy parameters
//!
//! The parameter set is edited locally, clamped into range, compared against
//! the last values sent and encoded into an 8-byte buffer for the device.

pub mod codec;
mod error;
mod set;
mod types;

pub use codec::{decode, encode, Encoded, BUFFER_LEN};
pub use error::{DecodeError, EncodeError, ParamKeyError};
pub use set::ParameterSet;
pub use types::{Nudge, ParamKey, ParamValues, Parameter, PARAM_COUNT};
