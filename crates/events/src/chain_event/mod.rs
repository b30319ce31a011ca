// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod auction;
mod ledger;

pub use auction::*;
pub use ledger::*;

use crate::Event;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to help define From traits for ChainEvent
macro_rules! impl_from_event {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for ChainEvent {
                fn from(data: $variant) -> Self {
                    ChainEvent::$variant(data)
                }
            }
        )*
    };
}

/// Events emitted by the ledger and auction contracts
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainEvent {
    Minted(Minted),
    Transferred(Transferred),
    UserBalanceDecrypted(UserBalanceDecrypted),
    AuctionCreated(AuctionCreated),
    BidPlaced(BidPlaced),
    AuctionClosed(AuctionClosed),
    BidSettled(BidSettled),
    AuctionSettled(AuctionSettled),
}

impl_from_event!(
    Minted,
    Transferred,
    UserBalanceDecrypted,
    AuctionCreated,
    BidPlaced,
    AuctionClosed,
    BidSettled,
    AuctionSettled
);

impl Event for ChainEvent {
    fn event_type(&self) -> String {
        let name = match self {
            ChainEvent::Minted(_) => "Minted",
            ChainEvent::Transferred(_) => "Transferred",
            ChainEvent::UserBalanceDecrypted(_) => "UserBalanceDecrypted",
            ChainEvent::AuctionCreated(_) => "AuctionCreated",
            ChainEvent::BidPlaced(_) => "BidPlaced",
            ChainEvent::AuctionClosed(_) => "AuctionClosed",
            ChainEvent::BidSettled(_) => "BidSettled",
            ChainEvent::AuctionSettled(_) => "AuctionSettled",
        };
        name.to_string()
    }

    fn payload(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }
}

impl fmt::Display for ChainEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainEvent::Minted(data) => fmt::Display::fmt(data, f),
            ChainEvent::Transferred(data) => fmt::Display::fmt(data, f),
            ChainEvent::UserBalanceDecrypted(data) => fmt::Display::fmt(data, f),
            ChainEvent::AuctionCreated(data) => fmt::Display::fmt(data, f),
            ChainEvent::BidPlaced(data) => fmt::Display::fmt(data, f),
            ChainEvent::AuctionClosed(data) => fmt::Display::fmt(data, f),
            ChainEvent::BidSettled(data) => fmt::Display::fmt(data, f),
            ChainEvent::AuctionSettled(data) => fmt::Display::fmt(data, f),
        }
    }
}
