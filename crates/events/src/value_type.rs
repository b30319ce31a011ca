// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ConfidentialError;
use alloy_primitives::U256;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Declared bit width of an encrypted value. The discriminant is the wire code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueType {
    Bool = 0,
    Uint4 = 1,
    Uint8 = 2,
    Uint16 = 3,
    Uint32 = 4,
    Uint64 = 5,
    Uint128 = 6,
    Uint160 = 7,
    Uint256 = 8,
}

impl ValueType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn bits(self) -> usize {
        match self {
            ValueType::Bool => 1,
            ValueType::Uint4 => 4,
            ValueType::Uint8 => 8,
            ValueType::Uint16 => 16,
            ValueType::Uint32 => 32,
            ValueType::Uint64 => 64,
            ValueType::Uint128 => 128,
            ValueType::Uint160 => 160,
            ValueType::Uint256 => 256,
        }
    }

    /// Largest value representable by this type
    pub fn max(self) -> U256 {
        match self {
            ValueType::Uint256 => U256::MAX,
            other => (U256::from(1u8) << other.bits()) - U256::from(1u8),
        }
    }

    /// Reduces `value` modulo 2^bits
    pub fn wrap(self, value: U256) -> U256 {
        value & self.max()
    }

    /// Fails with `EncodingError` if `value` is out of range
    pub fn check(self, value: U256) -> Result<(), ConfidentialError> {
        if value > self.max() {
            return Err(ConfidentialError::EncodingError(format!(
                "{value} exceeds {self} range"
            )));
        }
        Ok(())
    }

    /// Type of a binary arithmetic result: the wider of both operands
    pub fn widest(self, other: ValueType) -> ValueType {
        Ord::max(self, other)
    }
}

impl TryFrom<u8> for ValueType {
    type Error = ConfidentialError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => ValueType::Bool,
            1 => ValueType::Uint4,
            2 => ValueType::Uint8,
            3 => ValueType::Uint16,
            4 => ValueType::Uint32,
            5 => ValueType::Uint64,
            6 => ValueType::Uint128,
            7 => ValueType::Uint160,
            8 => ValueType::Uint256,
            other => {
                return Err(ConfidentialError::EncodingError(format!(
                    "unknown value type code {other}"
                )))
            }
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "ebool"),
            other => write!(f, "euint{}", other.bits()),
        }
    }
}

/// Encryption scheme tag carried by every ciphertext
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EncryptionScheme {
    Ecies = 1,
}

impl EncryptionScheme {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for EncryptionScheme {
    type Error = ConfidentialError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(EncryptionScheme::Ecies),
            other => Err(ConfidentialError::InvalidCiphertext(format!(
                "unknown scheme {other}"
            ))),
        }
    }
}
