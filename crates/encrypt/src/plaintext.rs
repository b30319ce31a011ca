// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cv_events::{ConfidentialError, ValueType, U256};
use zeroize::Zeroizing;

/// `value (32 bytes BE) || type code`
pub const PLAINTEXT_LEN: usize = 33;

/// Encodes a value tagged with its declared type, failing if it does not fit the type
pub fn encode_plaintext(
    value: U256,
    value_type: ValueType,
) -> Result<Zeroizing<[u8; PLAINTEXT_LEN]>, ConfidentialError> {
    value_type.check(value)?;
    let mut out = Zeroizing::new([0u8; PLAINTEXT_LEN]);
    out[..32].copy_from_slice(&value.to_be_bytes::<32>());
    out[32] = value_type.code();
    Ok(out)
}

/// Decodes a tagged value and checks the tag against the type the ciphertext declares
pub fn decode_plaintext(bytes: &[u8], expected: ValueType) -> Result<U256, ConfidentialError> {
    if bytes.len() != PLAINTEXT_LEN {
        return Err(ConfidentialError::InvalidCiphertext(format!(
            "plaintext of {} bytes",
            bytes.len()
        )));
    }
    let actual = ValueType::try_from(bytes[32])?;
    if actual != expected {
        return Err(ConfidentialError::TypeMismatch { expected, actual });
    }
    let value = U256::from_be_slice(&bytes[..32]);
    expected
        .check(value)
        .map_err(|e| ConfidentialError::InvalidCiphertext(e.to_string()))?;
    Ok(value)
}
