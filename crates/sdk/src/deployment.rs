// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::{Context as _, Result};
use cv_auction::AuctionEngine;
use cv_config::{AppConfig, DisclosureConfig};
use cv_crypto::EciesPublicKey;
use cv_disclosure::DisclosureService;
use cv_host::HostChain;
use cv_kms::{DecryptionNetwork, HttpDecryptionNetwork, LocalNetwork};
use cv_ledger::ConfidentialLedger;
use std::sync::Arc;
use tracing::info;

/// The ledger and auction contracts on one chain, wired to the network that decrypts for it
#[derive(Clone)]
pub struct Deployment {
    pub host: HostChain,
    pub network_key: EciesPublicKey,
    pub disclosure: DisclosureService,
    pub ledger: ConfidentialLedger,
    pub auction: AuctionEngine,
}

impl Deployment {
    /// Deploys both contracts with `owner` as ledger owner and auction deployer
    pub fn new(
        host: HostChain,
        network: Arc<dyn DecryptionNetwork>,
        network_key: EciesPublicKey,
        owner: Address,
        config: DisclosureConfig,
    ) -> Result<Self> {
        let disclosure = DisclosureService::new(network, Arc::new(host.clone()), config);
        let ledger = ConfidentialLedger::deploy(host.clone(), disclosure.clone(), owner)?;
        let auction = AuctionEngine::deploy(host.clone(), ledger.clone(), disclosure.clone(), owner);
        info!(
            chain_id = host.chain_id(),
            ledger = %ledger.address(),
            auction = %auction.address(),
            "contracts deployed"
        );
        Ok(Self {
            host,
            network_key,
            disclosure,
            ledger,
            auction,
        })
    }

    /// Deploys against an in process decryption network following `host`
    pub fn local(
        host: HostChain,
        owner: Address,
        config: DisclosureConfig,
    ) -> Result<(Self, LocalNetwork)> {
        let network = LocalNetwork::spawn(host.clone());
        let deployment = Self::new(
            host,
            Arc::new(network.clone()),
            network.public_key(),
            owner,
            config,
        )?;
        Ok((deployment, network))
    }

    /// Deploys against the decryption network configured for the host's chain.
    ///
    /// The contracts must land at the addresses configured for the chain, otherwise clients
    /// would bind their ciphertexts to contracts that do not exist.
    pub fn from_config(host: HostChain, config: &AppConfig, owner: Address) -> Result<Self> {
        let chain = config.chain(host.chain_id())?;
        let network = HttpDecryptionNetwork::from_chain(chain, &config.disclosure)?;
        let key = chain
            .network_public_key
            .as_deref()
            .with_context(|| format!("No network_public_key configured for {}", chain.name))?;
        let network_key = EciesPublicKey::from_hex(key)
            .with_context(|| format!("Invalid network_public_key for {}", chain.name))?;
        let deployment = Self::new(
            host,
            Arc::new(network),
            network_key,
            owner,
            config.disclosure,
        )?;
        chain
            .contracts
            .ensure_deployed_at(deployment.ledger.address(), deployment.auction.address())
            .with_context(|| format!("Contracts on {} differ from the configuration", chain.name))?;
        Ok(deployment)
    }
}
