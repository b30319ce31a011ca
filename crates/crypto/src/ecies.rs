// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CryptoError;
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use core::fmt;
use hkdf::Hkdf;
use k256::{
    ecdh::{diffie_hellman, EphemeralSecret},
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey, SecretKey,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use zeroize::Zeroizing;

/// Length of a compressed SEC1 secp256k1 point
pub const EPHEMERAL_KEY_LEN: usize = 33;
pub const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;
const HKDF_SALT: &[u8] = b"cv/ecies/v1";

/// Derives the AES-256 key for one envelope.
///
/// The HKDF info binds both public points so an envelope cannot be replayed against a
/// different recipient key.
fn derive_key(
    shared_secret: &[u8],
    ephemeral_public: &[u8],
    recipient_public: &[u8],
) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let mut info = Vec::with_capacity(ephemeral_public.len() + recipient_public.len());
    info.extend_from_slice(ephemeral_public);
    info.extend_from_slice(recipient_public);

    let mut okm = Zeroizing::new([0u8; KEY_LEN]);
    Hkdf::<Sha256>::new(Some(HKDF_SALT), shared_secret)
        .expand(&info, okm.as_mut())
        .map_err(|_| CryptoError::KeyDerivation)?;
    Ok(okm)
}

/// A secp256k1 public key used as an ECIES recipient.
///
/// The decryption network publishes one of these; viewers generate a fresh one for every
/// disclosure so that returned shares are readable only by them.
#[derive(Clone, PartialEq, Eq)]
pub struct EciesPublicKey(PublicKey);

impl EciesPublicKey {
    /// Parse a SEC1 encoded key (compressed or uncompressed)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey(format!("{} bytes", bytes.len())))
    }

    /// Parse a hex encoded SEC1 key, with or without `0x` prefix
    pub fn from_hex(value: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(value.trim_start_matches("0x"))
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Compressed SEC1 encoding
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(true).as_bytes().to_vec()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for EciesPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EciesPublicKey({})", self.to_hex())
    }
}

impl fmt::Display for EciesPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for EciesPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EciesPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        EciesPublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The secret half of an ECIES keypair. The inner scalar is zeroized on drop.
#[derive(Clone)]
pub struct EciesSecretKey(SecretKey);

impl EciesSecretKey {
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(SecretKey::random(rng))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidSecretKey)
    }

    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.0.to_bytes().to_vec())
    }

    pub fn public_key(&self) -> EciesPublicKey {
        EciesPublicKey(self.0.public_key())
    }
}

impl fmt::Debug for EciesSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EciesSecretKey(<redacted>)")
    }
}

/// Encrypts `plaintext` to `recipient` using ECIES over secp256k1.
///
/// The sealing process:
/// 1. Generates a fresh ephemeral secret (never reused across calls)
/// 2. Runs ECDH between the ephemeral secret and the recipient key
/// 3. Derives an AES-256 key with HKDF-SHA256
/// 4. Encrypts with AES-256-GCM, authenticating `aad` alongside the plaintext
///
/// # Returns
/// * `Ok(Vec<u8>)` - Envelope in format: [ephemeral public key][nonce][ciphertext + tag]
/// * `Err(CryptoError)` - If key derivation or encryption fails
pub fn seal<R: RngCore + CryptoRng>(
    recipient: &EciesPublicKey,
    plaintext: &[u8],
    aad: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = EphemeralSecret::random(rng);
    let ephemeral_public = ephemeral
        .public_key()
        .to_encoded_point(true)
        .as_bytes()
        .to_vec();
    let shared = ephemeral.diffie_hellman(&recipient.0);
    let key = derive_key(
        shared.raw_secret_bytes().as_slice(),
        &ephemeral_public,
        &recipient.to_bytes(),
    )?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_ref()).map_err(|_| CryptoError::Encryption)?;
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Encryption)?;

    let mut output = Vec::with_capacity(EPHEMERAL_KEY_LEN + NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&ephemeral_public);
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypts an envelope produced by [`seal`].
///
/// Fails if the envelope is truncated, was sealed to another key, or if `aad` differs from
/// the data authenticated at sealing time.
pub fn open(
    secret: &EciesSecretKey,
    envelope: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    const HEADER_LEN: usize = EPHEMERAL_KEY_LEN + NONCE_LEN;

    if envelope.len() < HEADER_LEN + TAG_LEN {
        return Err(CryptoError::MalformedEnvelope(format!(
            "envelope of {} bytes is too short",
            envelope.len()
        )));
    }

    let ephemeral_public = &envelope[..EPHEMERAL_KEY_LEN];
    let nonce = Nonce::from_slice(&envelope[EPHEMERAL_KEY_LEN..HEADER_LEN]);
    let ciphertext = &envelope[HEADER_LEN..];

    let ephemeral = PublicKey::from_sec1_bytes(ephemeral_public)
        .map_err(|_| CryptoError::MalformedEnvelope("bad ephemeral key".to_string()))?;
    let shared = diffie_hellman(secret.0.to_nonzero_scalar(), ephemeral.as_affine());
    let key = derive_key(
        shared.raw_secret_bytes().as_slice(),
        ephemeral_public,
        &secret.public_key().to_bytes(),
    )?;

    let cipher = Aes256Gcm::new_from_slice(key.as_ref()).map_err(|_| CryptoError::Decryption)?;
    let plaintext = cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Decryption)?;

    Ok(Zeroizing::new(plaintext))
}
