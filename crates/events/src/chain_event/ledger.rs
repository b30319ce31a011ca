// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Handle;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Minted {
    pub account: Address,
    /// Balance handle after the mint
    pub balance: Handle,
}

impl Display for Minted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transferred {
    pub from: Address,
    pub to: Address,
    pub amount: Handle,
}

impl Display for Transferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Emitted once a balance disclosure requested through the ledger has completed
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserBalanceDecrypted {
    pub user: Address,
    pub decrypted_amount: U256,
}

impl Display for UserBalanceDecrypted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // amount stays out of log lines
        write!(f, "UserBalanceDecrypted {{ user: {} }}", self.user)
    }
}
