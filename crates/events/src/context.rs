// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ConfidentialError;
use alloy_primitives::{keccak256, Address, B256};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Byte length of [`Context::encode`]
pub const CONTEXT_ENCODED_LEN: usize = 8 + 20 + 20;

/// The (chain, contract, user) triple a ciphertext is bound to.
///
/// A handle created under one context is meaningless under any other: the encryption gateway
/// authenticates the encoded context alongside the ciphertext and the host chain refuses inputs
/// whose context does not match the call they arrive in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    pub chain_id: u64,
    pub contract: Address,
    pub user: Address,
}

impl Context {
    pub fn new(chain_id: u64, contract: Address, user: Address) -> Self {
        Self {
            chain_id,
            contract,
            user,
        }
    }

    /// Canonical encoding: `chain_id (u64 BE) || contract || user`
    pub fn encode(&self) -> [u8; CONTEXT_ENCODED_LEN] {
        let mut out = [0u8; CONTEXT_ENCODED_LEN];
        out[..8].copy_from_slice(&self.chain_id.to_be_bytes());
        out[8..28].copy_from_slice(self.contract.as_slice());
        out[28..].copy_from_slice(self.user.as_slice());
        out
    }

    pub fn digest(&self) -> B256 {
        keccak256(self.encode())
    }

    /// The same chain and contract viewed by another user
    pub fn for_user(&self, user: Address) -> Self {
        Self { user, ..*self }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.chain_id, self.contract, self.user)
    }
}

/// Parses a 20 byte hex address.
///
/// Lowercase and uppercase forms are accepted as is; mixed case input must carry a valid
/// EIP-55 checksum.
pub fn parse_address(value: &str) -> Result<Address, ConfidentialError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfidentialError::InvalidAddress(value.to_string()));
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{digits}"), None)
            .map_err(|_| ConfidentialError::InvalidAddress(value.to_string()));
    }

    Address::from_str(digits).map_err(|_| ConfidentialError::InvalidAddress(value.to_string()))
}

/// Builds the binding record for one holder on one contract on one chain
pub fn bind(chain_id: u64, contract: &str, user: &str) -> Result<Context, ConfidentialError> {
    Ok(Context::new(
        chain_id,
        parse_address(contract)?,
        parse_address(user)?,
    ))
}
