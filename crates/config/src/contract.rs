// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use cv_events::parse_address;
use serde::{Deserialize, Serialize};

/// Where the ledger and auction contracts of a chain are expected to live
#[derive(Debug, Clone, Hash, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContractAddresses {
    pub ledger: String,
    pub auction: String,
}

impl ContractAddresses {
    pub fn ledger(&self) -> Result<Address> {
        parse_address(&self.ledger)
            .with_context(|| format!("Invalid ledger address '{}'", self.ledger))
    }

    pub fn auction(&self) -> Result<Address> {
        parse_address(&self.auction)
            .with_context(|| format!("Invalid auction address '{}'", self.auction))
    }

    /// Fails unless the deployed contracts sit at the configured addresses
    pub fn ensure_deployed_at(&self, ledger: Address, auction: Address) -> Result<()> {
        let (expected_ledger, expected_auction) = (self.ledger()?, self.auction()?);
        if expected_ledger != ledger {
            bail!("Ledger deployed at {ledger}, configured at {expected_ledger}");
        }
        if expected_auction != auction {
            bail!("Auction deployed at {auction}, configured at {expected_auction}");
        }
        Ok(())
    }
}
