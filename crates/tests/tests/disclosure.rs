// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::U256;
use anyhow::Result;
use cv_config::{DisclosureConfig, Endpoint, RpcAuth};
use cv_events::{ConfidentialError, ValueType};
use cv_host::HostChain;
use cv_kms::HttpDecryptionNetwork;
use cv_sdk::{Client, Deployment};
use cv_test_helpers::{
    app_config_for, init_test_logging, named_wallet, spawn_kms_server, TestEnv, TestEnvBuilder,
    TEST_CHAIN_ID,
};
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

fn short_budget() -> DisclosureConfig {
    DisclosureConfig {
        request_timeout_ms: 300,
        max_attempts: 3,
        initial_backoff_ms: 20,
        max_backoff_ms: 40,
        ..DisclosureConfig::fast()
    }
}

#[tokio::test]
async fn test_unreachable_network_gives_up() -> Result<()> {
    let _guard = init_test_logging();
    let env = TestEnv::new()?;
    let endpoint = Endpoint::from_url("http://127.0.0.1:9")?;
    let config = short_budget();
    let network = HttpDecryptionNetwork::new(&endpoint, RpcAuth::None, config.request_timeout())?;
    let offline = Deployment::new(
        env.host().clone(),
        Arc::new(network),
        env.deployment.network_key.clone(),
        env.client("alice")?.address(),
        config,
    )?;

    let alice = Client::new(named_wallet("alice").unwrap(), offline);
    let handle = alice.mint(alice.address(), U256::from(9))?;

    let started = Instant::now();
    let result = alice.disclose(handle).await;
    assert!(
        matches!(result, Err(ConfidentialError::DisclosureUnavailable(_))),
        "{result:?}"
    );
    // three attempts bounded by the request timeout plus backoff
    assert!(started.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[tokio::test]
async fn test_unavailable_network_recovers() -> Result<()> {
    let env = TestEnv::new()?;
    env.fund(&[("bob", 42)])?;
    env.network.synced().await;

    env.network.set_available(false);
    assert!(matches!(
        env.balance("bob").await,
        Err(e) if matches!(
            e.downcast_ref::<ConfidentialError>(),
            Some(ConfidentialError::DisclosureUnavailable(_))
        )
    ));

    env.network.set_available(true);
    assert_eq!(env.balance("bob").await?, U256::from(42));
    Ok(())
}

#[tokio::test]
async fn test_lagging_network_is_waited_for() -> Result<()> {
    let env = TestEnvBuilder::new()
        .with_network_delay(Duration::from_millis(30))
        .build()?;
    let carol = env.client("carol")?;
    let handle = env.client("alice")?.mint(carol.address(), U256::from(3))?;

    let requester = env.deployment.disclosure.requester_for(&handle, carol.address())?;
    assert!(matches!(
        env.deployment
            .disclosure
            .disclose(handle, &requester, carol.wallet())
            .await,
        Err(ConfidentialError::HandleNotReady(h)) if h == handle
    ));
    assert_eq!(carol.disclose(handle).await?, U256::from(3));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_disclosures() -> Result<()> {
    let env = TestEnv::new()?;
    let dave = env.client("dave")?;
    let ledger = env.deployment.ledger.address();

    let mut handles = vec![];
    for value in 0..8u64 {
        let input = dave.encrypt(U256::from(value * 11), ValueType::Uint32, ledger)?;
        handles.push(env.host().verify_input(ledger, dave.address(), &input)?);
    }
    env.network.synced().await;

    let requester = env.deployment.ledger.context_for(dave.address());
    let values = env
        .deployment
        .disclosure
        .disclose_all(&handles, &requester, dave.wallet())
        .await?;
    let expected: Vec<U256> = (0..8u64).map(|v| U256::from(v * 11)).collect();
    assert_eq!(values, expected);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial_test::serial]
async fn test_disclosure_over_http() -> Result<()> {
    let _guard = init_test_logging();
    let host = HostChain::new(TEST_CHAIN_ID);
    let (network, server) = spawn_kms_server(&host)?;
    let config = app_config_for(
        TEST_CHAIN_ID,
        &server.url(),
        &network.public_key(),
        DisclosureConfig::fast(),
    );

    let alice_wallet = named_wallet("alice").unwrap();
    let bob_wallet = named_wallet("bob").unwrap();
    let deployment = Deployment::from_config(host, &config, alice_wallet.address())?;
    let alice = Client::new(alice_wallet, deployment.clone());
    let bob = Client::new(bob_wallet, deployment);

    alice.mint(alice.address(), U256::from(1_000))?;
    alice.transfer(bob.address(), U256::from(300))?;

    assert_eq!(alice.balance().await?, U256::from(700));
    assert_eq!(bob.balance().await?, U256::from(300));

    // bob is not on the ACL of alice's balance
    let alice_balance = alice.balance_of().unwrap();
    assert!(matches!(
        bob.disclose(alice_balance).await,
        Err(ConfidentialError::Unauthorized(_))
    ));

    server.stop().await;
    Ok(())
}

#[test]
fn test_unknown_chain_has_no_network() -> Result<()> {
    let host = HostChain::new(TEST_CHAIN_ID);
    let config = app_config_for(
        TEST_CHAIN_ID + 1,
        "http://127.0.0.1:50055",
        &cv_crypto::EciesSecretKey::random(&mut rand::rngs::OsRng).public_key(),
        DisclosureConfig::fast(),
    );
    let owner = named_wallet("alice").unwrap().address();
    assert!(Deployment::from_config(host, &config, owner).is_err());
    Ok(())
}

#[test]
fn test_contracts_must_match_configuration() -> Result<()> {
    let config = app_config_for(
        TEST_CHAIN_ID,
        "http://127.0.0.1:50055",
        &cv_crypto::EciesSecretKey::random(&mut rand::rngs::OsRng).public_key(),
        DisclosureConfig::fast(),
    );

    let alice = named_wallet("alice").unwrap().address();
    let deployment = Deployment::from_config(HostChain::new(TEST_CHAIN_ID), &config, alice)?;
    assert_eq!(
        deployment.ledger.address(),
        config.chains[0].contracts.ledger()?
    );

    // bob's deployments land elsewhere
    let bob = named_wallet("bob").unwrap().address();
    assert!(Deployment::from_config(HostChain::new(TEST_CHAIN_ID), &config, bob).is_err());
    Ok(())
}
