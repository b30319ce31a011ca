// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    contract::ContractAddresses,
    rpc::{Endpoint, RpcAuth},
};
use anyhow::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Hash, Eq, Deserialize, Serialize)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    /// Credentials sent with every request to the decryption network
    #[serde(default)]
    pub rpc_auth: RpcAuth,
    /// Base URL of the decryption network serving this chain
    pub kms_endpoint: String,
    /// Hex encoded SEC1 key the encryption gateway encrypts to
    pub network_public_key: Option<String>,
    pub contracts: ContractAddresses,
}

impl ChainConfig {
    pub fn kms_endpoint(&self) -> Result<Endpoint> {
        Endpoint::from_url(&self.kms_endpoint)
            .map_err(|e| anyhow!("Failed to parse KMS endpoint for chain {}: {}", self.name, e))
    }

    /// Checks every URL and address in this entry
    pub fn validate(&self) -> Result<()> {
        self.kms_endpoint()?;
        self.contracts
            .ledger()
            .with_context(|| format!("ledger contract on chain {}", self.name))?;
        self.contracts
            .auction()
            .with_context(|| format!("auction contract on chain {}", self.name))?;
        Ok(())
    }
}
