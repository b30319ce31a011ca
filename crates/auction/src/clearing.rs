// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A bid after disclosure. `index` is its insertion position in the auction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlainBid {
    pub index: usize,
    pub quantity: U256,
    pub price: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clearing {
    pub clearing_price: U256,
    pub total_quantity_sold: U256,
    /// Quantity allocated to each bid, by insertion index
    pub fills: Vec<U256>,
}

/// Uniform price clearing of sealed bids.
///
/// Bids below `min_price` never fill. The rest are served by price, highest first, earlier
/// bids first at equal price, until `supply` runs out; the last served bid may fill
/// partially. Every filled bid pays the price of the last served bid, or `min_price` when the
/// eligible demand does not exhaust the supply.
pub fn clear(bids: &[PlainBid], supply: U256, min_price: U256) -> Clearing {
    let mut fills = vec![U256::ZERO; bids.iter().map(|b| b.index + 1).max().unwrap_or(0)];

    let mut ranked: Vec<&PlainBid> = bids.iter().filter(|b| b.price >= min_price).collect();
    // stable, so insertion order breaks ties
    ranked.sort_by_key(|b| b.index);
    ranked.sort_by(|a, b| b.price.cmp(&a.price));

    let mut remaining = supply;
    let mut last_price = None;
    for bid in ranked {
        if remaining.is_zero() {
            break;
        }
        if bid.quantity.is_zero() {
            continue;
        }
        let fill = bid.quantity.min(remaining);
        fills[bid.index] = fill;
        remaining -= fill;
        last_price = Some(bid.price);
    }

    let clearing_price = match last_price {
        Some(price) if remaining.is_zero() => price,
        _ => min_price,
    };

    Clearing {
        clearing_price,
        total_quantity_sold: supply - remaining,
        fills,
    }
}
