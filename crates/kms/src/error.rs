// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cv_events::{ConfidentialError, Handle};
use thiserror::Error;

/// Failures reported by a decryption network
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("request denied: {0}")]
    Denied(String),

    #[error("context mismatch: {0}")]
    ContextMismatch(String),

    #[error("no value for handle {0} yet")]
    NotReady(Handle),

    #[error("network unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl NetworkError {
    /// Transport level failures worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, NetworkError::Unavailable(_))
    }
}

impl From<NetworkError> for ConfidentialError {
    fn from(value: NetworkError) -> Self {
        match value {
            NetworkError::Denied(msg) => ConfidentialError::Unauthorized(msg),
            NetworkError::ContextMismatch(msg) => ConfidentialError::ContextMismatch(msg),
            NetworkError::NotReady(handle) => ConfidentialError::HandleNotReady(handle),
            NetworkError::Unavailable(msg) => ConfidentialError::DisclosureUnavailable(msg),
            NetworkError::Malformed(msg) => ConfidentialError::InvalidCiphertext(msg),
        }
    }
}
