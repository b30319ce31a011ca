// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use cv_config::{AppConfig, ChainConfig, ContractAddresses, DisclosureConfig, RpcAuth};
use cv_crypto::EciesPublicKey;
use cv_host::HostChain;
use cv_kms::{KmsServer, LocalNetwork, RunningServer};
use std::sync::Arc;
use tracing::info;

/// Serves a local network for `host` over HTTP on a free port
pub fn spawn_kms_server(host: &HostChain) -> Result<(LocalNetwork, RunningServer)> {
    let network = LocalNetwork::spawn(host.clone());
    let server = KmsServer::new(Arc::new(network.clone()))
        .with_host("127.0.0.1")
        .with_port(0)
        .spawn()?;
    info!(url = %server.url(), "test kms listening");
    Ok((network, server))
}

/// Configuration for a single chain whose decryption network sits at `kms_endpoint`, with the
/// contracts alice deploys on a fresh chain
pub fn app_config_for(
    chain_id: u64,
    kms_endpoint: &str,
    network_key: &EciesPublicKey,
    disclosure: DisclosureConfig,
) -> AppConfig {
    AppConfig {
        chains: vec![ChainConfig {
            name: "hardhat".to_string(),
            chain_id,
            rpc_auth: RpcAuth::None,
            kms_endpoint: kms_endpoint.to_string(),
            network_public_key: Some(network_key.to_hex()),
            // where alice's first two deployments land
            contracts: ContractAddresses {
                ledger: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
                auction: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".to_string(),
            },
        }],
        disclosure,
        ..AppConfig::default()
    }
}
