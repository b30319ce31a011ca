// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{decode_plaintext, encode_plaintext};
use cv_crypto::{open, seal, CryptoError, EciesPublicKey, EciesSecretKey};
use cv_events::{
    Ciphertext, ConfidentialError, Context, EncryptionScheme, InputCiphertext, ValueType, U256,
};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use tracing::trace;

fn key_agreement(e: CryptoError) -> ConfidentialError {
    ConfidentialError::KeyAgreementError(e.to_string())
}

/// Encrypt a value for the decryption network, bound to one context
///
/// # Arguments
/// * `value` - The plaintext integer
/// * `value_type` - Declared bit width, `value` must fit in it
/// * `context` - Chain, contract and user the ciphertext is valid for
/// * `network_public_key` - SEC1 encoded network key
///
/// # Returns
/// * `Result<InputCiphertext>` - The ciphertext with its prehandle and handle
///
/// # Errors
/// - `EncodingError` if the value exceeds the declared type range
/// - `KeyAgreementError` if the network key is malformed
pub fn encrypt(
    value: U256,
    value_type: ValueType,
    context: &Context,
    network_public_key: &[u8],
) -> Result<InputCiphertext, ConfidentialError> {
    Encryptor::new(network_public_key)?.encrypt(value, value_type, context)
}

/// Encryption gateway holding a parsed network key
#[derive(Clone, Debug)]
pub struct Encryptor {
    network_key: EciesPublicKey,
}

impl Encryptor {
    pub fn new(network_public_key: &[u8]) -> Result<Self, ConfidentialError> {
        let network_key = EciesPublicKey::from_bytes(network_public_key).map_err(key_agreement)?;
        Ok(Self { network_key })
    }

    pub fn from_hex(network_public_key: &str) -> Result<Self, ConfidentialError> {
        let network_key = EciesPublicKey::from_hex(network_public_key).map_err(key_agreement)?;
        Ok(Self { network_key })
    }

    pub fn from_key(network_key: EciesPublicKey) -> Self {
        Self { network_key }
    }

    pub fn network_key(&self) -> &EciesPublicKey {
        &self.network_key
    }

    pub fn encrypt(
        &self,
        value: U256,
        value_type: ValueType,
        context: &Context,
    ) -> Result<InputCiphertext, ConfidentialError> {
        self.encrypt_with_rng(value, value_type, context, &mut OsRng)
    }

    /// Encrypts with a caller supplied randomness source.
    ///
    /// Every call draws a fresh ephemeral key from `rng`, so equal values never produce equal
    /// ciphertexts or handles.
    pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
        &self,
        value: U256,
        value_type: ValueType,
        context: &Context,
        rng: &mut R,
    ) -> Result<InputCiphertext, ConfidentialError> {
        let plaintext = encode_plaintext(value, value_type)?;
        let scheme = EncryptionScheme::Ecies;
        let aad = Ciphertext::aad(scheme, value_type, context);
        let payload =
            seal(&self.network_key, plaintext.as_ref(), &aad, rng).map_err(key_agreement)?;

        let input = InputCiphertext::new(Ciphertext::new(scheme, value_type, payload), *context);
        trace!(handle = %input.handle, context = %context, "encrypted input");
        Ok(input)
    }
}

/// Recovers the value of a ciphertext with the network secret key.
///
/// Fails with `InvalidCiphertext` if the ciphertext was not bound to `context`.
pub fn decrypt_input(
    network_secret: &EciesSecretKey,
    ciphertext: &Ciphertext,
    context: &Context,
) -> Result<U256, ConfidentialError> {
    let aad = Ciphertext::aad(ciphertext.scheme, ciphertext.value_type, context);
    let plaintext = open(network_secret, &ciphertext.payload, &aad)
        .map_err(|e| ConfidentialError::InvalidCiphertext(e.to_string()))?;
    decode_plaintext(&plaintext, ciphertext.value_type)
}
