// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{AuctionId, Handle};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuctionCreated {
    pub auction_id: AuctionId,
    pub creator: Address,
    pub token: Address,
    pub supply: U256,
    pub min_price: U256,
    /// Unix seconds
    pub deadline: u64,
}

impl Display for AuctionCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BidPlaced {
    pub auction_id: AuctionId,
    pub bidder: Address,
    pub bid_index: usize,
    pub quantity: Handle,
    pub price: Handle,
    pub escrow: U256,
}

impl Display for BidPlaced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuctionClosed {
    pub auction_id: AuctionId,
}

impl Display for AuctionClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BidSettled {
    pub auction_id: AuctionId,
    pub bidder: Address,
    pub bid_index: usize,
    pub quantity_filled: U256,
    pub refund: U256,
}

impl Display for BidSettled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuctionSettled {
    pub auction_id: AuctionId,
    pub clearing_price: U256,
    pub total_quantity_sold: U256,
}

impl Display for AuctionSettled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
