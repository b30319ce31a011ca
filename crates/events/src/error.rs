// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{AuctionId, Handle, ValueType};
use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Every failure the confidential value protocol surfaces to its callers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfidentialError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("key agreement error: {0}")]
    KeyAgreementError(String),

    #[error("context mismatch: {0}")]
    ContextMismatch(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("handle {0} is not ready")]
    HandleNotReady(Handle),

    #[error("disclosure unavailable: {0}")]
    DisclosureUnavailable(String),

    #[error("auction {0} is already settled")]
    AuctionAlreadySettled(AuctionId),

    #[error("auction {0} has no bids")]
    NoBids(AuctionId),

    #[error("insufficient escrow: required {required}, provided {provided}")]
    InsufficientEscrow { required: U256, provided: U256 },

    #[error("{account} holds {available}, {required} needed")]
    InsufficientFunds {
        account: Address,
        required: U256,
        available: U256,
    },

    #[error("auction supply {supply} is not covered by the creator, {escrowed} escrowed")]
    SupplyNotCovered { supply: U256, escrowed: U256 },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("input {0} was already consumed")]
    InputAlreadyConsumed(Handle),

    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("auction {0} not found")]
    AuctionNotFound(AuctionId),

    #[error("auction {0} is not open")]
    AuctionNotOpen(AuctionId),

    #[error("auction {0} deadline has not been reached")]
    DeadlineNotReached(AuctionId),

    #[error("network error: {0}")]
    Network(String),
}

impl ConfidentialError {
    /// Whether the caller may retry the same call later and expect a different outcome
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConfidentialError::HandleNotReady(_) | ConfidentialError::DisclosureUnavailable(_)
        )
    }
}
