// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Context, EncryptionScheme, Handle, ValueType};
use alloy_primitives::{keccak256, B256};
use cv_utils::ArcBytes;
use serde::{Deserialize, Serialize};

const HANDLE_DOMAIN: &[u8] = b"cv/handle";
const PREHANDLE_DOMAIN: &[u8] = b"cv/prehandle";

/// An encrypted value. Opaque to everyone except the decryption network.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ciphertext {
    pub scheme: EncryptionScheme,
    pub value_type: ValueType,
    pub payload: ArcBytes,
}

impl Ciphertext {
    pub fn new(scheme: EncryptionScheme, value_type: ValueType, payload: Vec<u8>) -> Self {
        Self {
            scheme,
            value_type,
            payload: ArcBytes::from_bytes(&payload),
        }
    }

    /// Associated data authenticated with the payload: `scheme || type || context`
    pub fn aad(scheme: EncryptionScheme, value_type: ValueType, context: &Context) -> Vec<u8> {
        let mut aad = Vec::with_capacity(2 + crate::CONTEXT_ENCODED_LEN);
        aad.push(scheme.code());
        aad.push(value_type.code());
        aad.extend_from_slice(&context.encode());
        aad
    }

    /// Digest of the ciphertext alone, used to register it before it is bound
    pub fn prehandle(&self) -> B256 {
        let mut preimage = Vec::with_capacity(PREHANDLE_DOMAIN.len() + self.payload.len() + 2);
        preimage.extend_from_slice(PREHANDLE_DOMAIN);
        preimage.extend_from_slice(&self.payload);
        preimage.push(self.value_type.code());
        preimage.push(self.scheme.code());
        keccak256(preimage)
    }

    /// Handle of this ciphertext bound to `context`
    pub fn handle_for(&self, context: &Context) -> Handle {
        let mut preimage = Vec::with_capacity(HANDLE_DOMAIN.len() + 32 + 48);
        preimage.extend_from_slice(HANDLE_DOMAIN);
        preimage.extend_from_slice(self.prehandle().as_slice());
        preimage.extend_from_slice(&context.encode());
        Handle::from_digest(keccak256(preimage), self.value_type)
    }
}

/// The unit a client submits to the ledger or auction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputCiphertext {
    pub prehandle: B256,
    pub handle: Handle,
    pub context: Context,
    pub ciphertext: Ciphertext,
}

impl InputCiphertext {
    pub fn new(ciphertext: Ciphertext, context: Context) -> Self {
        Self {
            prehandle: ciphertext.prehandle(),
            handle: ciphertext.handle_for(&context),
            context,
            ciphertext,
        }
    }

    /// Whether the carried handle and prehandle are the digests of the carried ciphertext
    pub fn digests_match(&self) -> bool {
        self.prehandle == self.ciphertext.prehandle()
            && self.handle == self.ciphertext.handle_for(&self.context)
    }

    pub fn value_type(&self) -> ValueType {
        self.ciphertext.value_type
    }
}
