// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{named_wallet, ACCOUNT_NAMES};
use alloy_primitives::U256;
use anyhow::{anyhow, Context, Result};
use cv_config::DisclosureConfig;
use cv_host::{HostChain, ManualClock};
use cv_kms::LocalNetwork;
use cv_logger::SimpleLogger;
use cv_sdk::{Client, Deployment};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing_subscriber::{fmt, EnvFilter};

pub const TEST_CHAIN_ID: u64 = 31337;
pub const GENESIS_TIME: u64 = 1_700_000_000;

/// Native balance every named account starts with, 10 000 coins of 18 decimals
pub fn dev_funds() -> U256 {
    U256::from(10_000u64) * U256::from(10u64).pow(U256::from(18))
}

/// Route logs of the current test through the test writer
pub fn init_test_logging() -> tracing::subscriber::DefaultGuard {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

pub struct TestEnvBuilder {
    chain_id: u64,
    config: DisclosureConfig,
    delay: Option<Duration>,
    logging: bool,
}

impl Default for TestEnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnvBuilder {
    pub fn new() -> Self {
        Self {
            chain_id: TEST_CHAIN_ID,
            config: DisclosureConfig::fast(),
            delay: None,
            logging: false,
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_config(mut self, config: DisclosureConfig) -> Self {
        self.config = config;
        self
    }

    /// Makes the decryption network lag behind the host by `delay` per operation
    pub fn with_network_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Logs every chain event as it is published
    pub fn with_logging(mut self) -> Self {
        self.logging = true;
        self
    }

    /// Deploys both contracts owned by alice and opens a funded client for every named account
    pub fn build(self) -> Result<TestEnv> {
        let clock = Arc::new(ManualClock::new(GENESIS_TIME));
        let host = HostChain::with_clock(self.chain_id, clock.clone());
        let owner = named_wallet("alice").context("alice wallet")?;
        if self.logging {
            SimpleLogger::attach("chain", host.events());
        }
        let (deployment, network) = Deployment::local(host, owner.address(), self.config)?;
        if let Some(delay) = self.delay {
            network.set_delay(delay);
        }

        let mut clients = HashMap::new();
        for name in ACCOUNT_NAMES {
            let wallet = named_wallet(name).with_context(|| format!("{name} wallet"))?;
            deployment
                .host
                .set_native_balance(wallet.address(), dev_funds());
            clients.insert(name, Client::new(wallet, deployment.clone()));
        }

        Ok(TestEnv {
            clock,
            network,
            deployment,
            clients,
        })
    }
}

/// A local chain with both contracts deployed and a client per named account.
/// Alice owns the ledger.
pub struct TestEnv {
    pub clock: Arc<ManualClock>,
    pub network: LocalNetwork,
    pub deployment: Deployment,
    clients: HashMap<&'static str, Client>,
}

impl TestEnv {
    pub fn new() -> Result<Self> {
        TestEnvBuilder::new().build()
    }

    pub fn client(&self, name: &str) -> Result<&Client> {
        self.clients
            .get(name)
            .ok_or_else(|| anyhow!("no test account named '{name}'"))
    }

    pub fn host(&self) -> &HostChain {
        &self.deployment.host
    }

    /// Mints `amount` to each listed account
    pub fn fund(&self, accounts: &[(&str, u64)]) -> Result<()> {
        let owner = self.client("alice")?;
        for (name, amount) in accounts {
            let account = self.client(name)?.address();
            owner.mint(account, U256::from(*amount))?;
        }
        Ok(())
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(secs);
    }

    /// Plaintext balance of a named account as the account itself sees it
    pub async fn balance(&self, name: &str) -> Result<U256> {
        Ok(self.client(name)?.balance().await?)
    }
}
