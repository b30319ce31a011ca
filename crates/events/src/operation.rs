// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{AuctionId, ConfidentialError, InputCiphertext};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// A state mutating call submitted to the ledger or auction contract.
///
/// The submitting account is implied by whoever signs the transaction, so it is not part of
/// the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Mint {
        account: Address,
        amount: U256,
    },
    Transfer {
        to: Address,
        amount: InputCiphertext,
    },
    CreateAuction {
        token: Address,
        supply: U256,
        duration_secs: u64,
        min_price: U256,
    },
    PlaceBid {
        auction_id: AuctionId,
        quantity: InputCiphertext,
        price: InputCiphertext,
        escrow: U256,
    },
    EndAuction {
        auction_id: AuctionId,
    },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Mint { .. } => "mint",
            Operation::Transfer { .. } => "transfer",
            Operation::CreateAuction { .. } => "create_auction",
            Operation::PlaceBid { .. } => "place_bid",
            Operation::EndAuction { .. } => "end_auction",
        }
    }

    /// Boundary checks that need no contract state
    pub fn validate(&self) -> Result<(), ConfidentialError> {
        match self {
            Operation::Mint { account, .. } if account.is_zero() => {
                Err(invalid("mint to the zero address"))
            }
            Operation::Transfer { to, .. } if to.is_zero() => {
                Err(invalid("transfer to the zero address"))
            }
            Operation::Transfer { amount, .. } => check_input(amount),
            Operation::CreateAuction { token, .. } if token.is_zero() => {
                Err(invalid("auction token is the zero address"))
            }
            Operation::CreateAuction { supply, .. } if supply.is_zero() => {
                Err(invalid("auction supply must be positive"))
            }
            Operation::CreateAuction { duration_secs: 0, .. } => {
                Err(invalid("auction duration must be positive"))
            }
            Operation::PlaceBid {
                quantity, price, ..
            } => {
                if quantity.context != price.context {
                    return Err(ConfidentialError::ContextMismatch(
                        "quantity and price are bound to different contexts".to_string(),
                    ));
                }
                if quantity.handle == price.handle {
                    return Err(invalid("quantity and price share a handle"));
                }
                check_input(quantity)?;
                check_input(price)
            }
            _ => Ok(()),
        }
    }
}

fn invalid(reason: &str) -> ConfidentialError {
    ConfidentialError::InvalidInput(reason.to_string())
}

fn check_input(input: &InputCiphertext) -> Result<(), ConfidentialError> {
    if !input.digests_match() {
        return Err(invalid("handle does not match ciphertext"));
    }
    Ok(())
}
