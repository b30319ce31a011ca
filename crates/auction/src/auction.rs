// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::{Address, U256};
use cv_events::{AuctionId, Handle};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionState {
    Open,
    Closed,
    Settled,
}

impl fmt::Display for AuctionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuctionState::Open => "open",
            AuctionState::Closed => "closed",
            AuctionState::Settled => "settled",
        };
        f.write_str(name)
    }
}

/// Progress of the clearing run of a closed auction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearingStatus {
    Idle,
    InFlight,
    /// The last run could not disclose every bid; clearing may be invoked again
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub auction_id: AuctionId,
    pub bidder: Address,
    pub quantity: Handle,
    pub price: Handle,
    /// Native coin paid in with the bid, an upper bound on what it can owe
    pub escrow: U256,
    pub settled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub clearing_price: U256,
    pub total_quantity_sold: U256,
    /// Per bid, by insertion index
    pub fills: Vec<U256>,
    pub refunds: Vec<U256>,
    /// Paid to the creator: quantity sold times clearing price
    pub proceeds: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub creator: Address,
    pub token: Address,
    pub supply: U256,
    /// Tokens the creator moved into the auction account for this auction
    pub escrow: Handle,
    pub min_price: U256,
    /// Unix timestamp in seconds
    pub deadline: u64,
    pub bids: Vec<Bid>,
    pub state: AuctionState,
    pub clearing: ClearingStatus,
    pub settlement: Option<Settlement>,
}
