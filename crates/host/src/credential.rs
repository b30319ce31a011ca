// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};

/// Proof, issued by the host at deployment, that the holder acts as a given contract.
///
/// Contracts present it when they disclose handles in their own name, eg. the auction reading
/// bids during clearing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractCredential {
    pub address: Address,
    pub attestation: B256,
}

pub(crate) fn attest(host_secret: &B256, chain_id: u64, address: &Address) -> B256 {
    let mut preimage = Vec::with_capacity(32 + 8 + 20);
    preimage.extend_from_slice(host_secret.as_slice());
    preimage.extend_from_slice(&chain_id.to_be_bytes());
    preimage.extend_from_slice(address.as_slice());
    keccak256(preimage)
}
