// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::NetworkError;
use alloy_primitives::{keccak256, B256, U256};
use cv_crypto::{
    combine_additive, open, seal, split_additive, EciesPublicKey, EciesSecretKey,
    RecoverableSignature,
};
use cv_events::{ConfidentialError, Context, Handle, ValueType};
use cv_host::ContractCredential;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Byte length of one opened share
pub const SHARE_LEN: usize = 32;

/// Proof that the requester may receive the re-encrypted value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    /// Signature by the requester's wallet over [`viewer_digest`]
    Viewer { signature: RecoverableSignature },
    /// Attestation the host issued to a deployed contract
    Contract { credential: ContractCredential },
}

/// Digest a viewer signs to bind a one time re-encryption key to a chain and contract
pub fn viewer_digest(requester: &Context, reencryption_key: &EciesPublicKey) -> B256 {
    let mut preimage = b"cv/viewer".to_vec();
    preimage.extend_from_slice(&requester.chain_id.to_be_bytes());
    preimage.extend_from_slice(requester.contract.as_slice());
    preimage.extend_from_slice(&reencryption_key.to_bytes());
    keccak256(preimage)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureRequest {
    pub correlation_id: u64,
    pub handle: Handle,
    pub requester: Context,
    pub credential: Credential,
    /// Public half of the keypair the shares are sealed to
    pub reencryption_key: EciesPublicKey,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedShare {
    pub party: u32,
    #[serde(with = "hex::serde")]
    pub envelope: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureResponse {
    pub handle: Handle,
    pub value_type: ValueType,
    pub threshold: u32,
    pub shares: Vec<SealedShare>,
}

fn share_aad(handle: &Handle, party: u32, requester: &Context) -> Vec<u8> {
    let mut aad = handle.as_slice().to_vec();
    aad.extend_from_slice(&party.to_be_bytes());
    aad.extend_from_slice(&requester.encode());
    aad
}

fn malformed(msg: impl Into<String>) -> ConfidentialError {
    ConfidentialError::InvalidCiphertext(msg.into())
}

impl DisclosureResponse {
    /// Splits `value` into `threshold` additive shares, each sealed to the request's
    /// re-encryption key and bound to the handle, the party index and the requester.
    pub fn seal<R: RngCore + CryptoRng>(
        request: &DisclosureRequest,
        value: U256,
        value_type: ValueType,
        threshold: u32,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        let shares = split_additive(value, threshold.max(1) as usize, rng)
            .into_iter()
            .zip(0u32..)
            .map(|(share, party)| {
                let aad = share_aad(&request.handle, party, &request.requester);
                seal(
                    &request.reencryption_key,
                    &share.to_be_bytes::<SHARE_LEN>(),
                    &aad,
                    rng,
                )
                .map(|envelope| SealedShare { party, envelope })
                .map_err(|e| NetworkError::Malformed(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            handle: request.handle,
            value_type,
            threshold: shares.len() as u32,
            shares,
        })
    }

    /// Opens every share with the one time secret and sums them.
    ///
    /// Fails with `InvalidCiphertext` when the response answers another handle, a share is
    /// missing or was sealed for a different requester, and with `TypeMismatch` when the
    /// tagged type differs from the type carried by the handle.
    pub fn open(
        &self,
        handle: &Handle,
        secret: &EciesSecretKey,
        requester: &Context,
    ) -> Result<U256, ConfidentialError> {
        if &self.handle != handle {
            return Err(malformed(format!(
                "response answers {} instead of {}",
                self.handle, handle
            )));
        }
        let expected = handle.value_type()?;
        if self.value_type != expected {
            return Err(ConfidentialError::TypeMismatch {
                expected,
                actual: self.value_type,
            });
        }
        if self.threshold == 0 || self.shares.len() != self.threshold as usize {
            return Err(malformed(format!(
                "expected {} shares, got {}",
                self.threshold,
                self.shares.len()
            )));
        }

        let mut opened = Vec::with_capacity(self.shares.len());
        for (index, share) in (0u32..).zip(&self.shares) {
            if share.party != index {
                return Err(malformed(format!("share {index} is out of order")));
            }
            let aad = share_aad(handle, share.party, requester);
            let bytes = open(secret, &share.envelope, &aad).map_err(|e| malformed(e.to_string()))?;
            if bytes.len() != SHARE_LEN {
                return Err(malformed(format!("share {index} has {} bytes", bytes.len())));
            }
            opened.push(U256::from_be_slice(&bytes));
        }

        let value = combine_additive(&opened);
        self.value_type
            .check(value)
            .map_err(|_| malformed("reconstructed value is out of range"))?;
        Ok(value)
    }
}
