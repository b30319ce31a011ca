// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ConfidentialError, ValueType};
use alloy_primitives::B256;
use core::fmt;
use serde::{Deserialize, Serialize};

pub const HANDLE_VERSION: u8 = 0;
const TYPE_BYTE: usize = 30;
const VERSION_BYTE: usize = 31;

/// A 32 byte reference standing in for an encrypted value in ledger and auction storage.
///
/// The first 30 bytes come from a keccak digest; byte 30 carries the declared [`ValueType`]
/// and byte 31 the handle version.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(B256);

impl Handle {
    /// Stamps the type and version bytes onto a digest
    pub fn from_digest(digest: B256, value_type: ValueType) -> Self {
        let mut bytes = digest.0;
        bytes[TYPE_BYTE] = value_type.code();
        bytes[VERSION_BYTE] = HANDLE_VERSION;
        Self(B256::from(bytes))
    }

    /// Wraps raw bytes received from a caller without checking them
    pub fn from_raw(raw: B256) -> Self {
        Self(raw)
    }

    pub fn value_type(&self) -> Result<ValueType, ConfidentialError> {
        ValueType::try_from(self.0[TYPE_BYTE])
    }

    pub fn version(&self) -> u8 {
        self.0[VERSION_BYTE]
    }

    pub fn as_b256(&self) -> &B256 {
        &self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(self.0);
        write!(f, "Handle(0x{}..{})", &hex[..8], &hex[56..])
    }
}
