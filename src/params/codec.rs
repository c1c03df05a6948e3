//! Parameter buffer codec
//!
//! Layout: four little-endian `u16` values at offsets 0, 2, 4 and 6, in
//! `ParamKey` order.

use bytes::{Buf, BufMut};

use super::error::{DecodeError, EncodeError};
use super::set::ParameterSet;
use super::types::{ParamKey, ParamValues, PARAM_COUNT};

/// Size of the encoded parameter buffer
pub const BUFFER_LEN: usize = PARAM_COUNT * 2;

/// Values that were encoded together with their buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoded {
    pub values: ParamValues,
    pub buffer: [u8; BUFFER_LEN],
}

/// Encode a validated parameter set.
///
/// Values are not clamped here; anything outside `u16` is an error.
pub fn encode(params: &ParameterSet) -> Result<Encoded, EncodeError> {
    let mut values = ParamValues([0; PARAM_COUNT]);
    for param in params.iter() {
        values[param.key] = u16::try_from(param.value).map_err(|_| EncodeError::ValueOutOfRange {
            key: param.key,
            value: param.value,
        })?;
    }

    Ok(Encoded {
        values,
        buffer: encode_values(&values),
    })
}

/// Encode raw values
pub fn encode_values(values: &ParamValues) -> [u8; BUFFER_LEN] {
    let mut buffer = [0u8; BUFFER_LEN];
    let mut writer = &mut buffer[..];
    for key in ParamKey::all() {
        writer.put_u16_le(values[*key]);
    }
    buffer
}

/// Decode a parameter buffer back into values
pub fn decode(data: &[u8]) -> Result<ParamValues, DecodeError> {
    if data.len() != BUFFER_LEN {
        return Err(DecodeError::InvalidLength {
            expected: BUFFER_LEN,
            actual: data.len(),
        });
    }

    let mut reader = data;
    let mut values = ParamValues([0; PARAM_COUNT]);
    for key in ParamKey::all() {
        values[*key] = reader.get_u16_le();
    }
    Ok(values)
}
