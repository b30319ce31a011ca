// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::U256;
use anyhow::Result;
use cv_events::{ChainEvent, ConfidentialError, InputCiphertext, UserBalanceDecrypted};
use cv_test_helpers::{TestEnv, ACCOUNT_NAMES};
use proptest::prelude::*;
use std::time::Duration;

/// Sum of every named account's disclosed balance
async fn total_supply(env: &TestEnv) -> Result<U256> {
    let mut total = U256::ZERO;
    for name in ACCOUNT_NAMES {
        total += env.balance(name).await?;
    }
    Ok(total)
}

async fn run_transfers(env: &TestEnv, transfers: &[(usize, usize, u64)]) -> Result<()> {
    for (from, to, amount) in transfers {
        let from = env.client(ACCOUNT_NAMES[*from])?;
        let to = env.client(ACCOUNT_NAMES[*to])?;
        from.transfer(to.address(), U256::from(*amount))?;
    }
    Ok(())
}

#[tokio::test]
async fn test_transfers_conserve_supply() -> Result<()> {
    let env = TestEnv::new()?;
    env.fund(&[("alice", 1_000), ("bob", 500)])?;

    run_transfers(
        &env,
        &[
            (0, 2, 250), // alice -> carol
            (1, 3, 500), // bob -> dave, all of it
            (3, 4, 120), // dave -> john
            (2, 1, 900), // carol overdraws, moves nothing
            (4, 4, 20),  // john to himself
        ],
    )
    .await?;

    assert_eq!(env.balance("alice").await?, U256::from(750));
    assert_eq!(env.balance("bob").await?, U256::ZERO);
    assert_eq!(env.balance("carol").await?, U256::from(250));
    assert_eq!(env.balance("dave").await?, U256::from(380));
    assert_eq!(env.balance("john").await?, U256::from(120));

    assert_eq!(total_supply(&env).await?, env.deployment.ledger.total_minted());
    Ok(())
}

#[tokio::test]
async fn test_only_minters_mint() -> Result<()> {
    let env = TestEnv::new()?;
    let bob = env.client("bob")?;
    let carol = env.client("carol")?;
    assert!(matches!(
        bob.mint(bob.address(), U256::from(10)),
        Err(ConfidentialError::Unauthorized(_))
    ));

    let ledger = &env.deployment.ledger;
    let owner = env.client("alice")?.address();
    ledger.add_minter(owner, bob.address())?;
    bob.mint(carol.address(), U256::from(10))?;
    assert_eq!(env.balance("carol").await?, U256::from(10));
    assert_eq!(ledger.total_minted(), U256::from(10));
    Ok(())
}

#[tokio::test]
async fn test_transfer_binds_ledger_context() -> Result<()> {
    let env = TestEnv::new()?;
    env.fund(&[("bob", 100)])?;
    let bob = env.client("bob")?;
    let carol = env.client("carol")?;

    // encrypted for the auction contract, replayed against the ledger
    let misbound = bob.encrypt(
        U256::from(40),
        cv_sdk::AMOUNT_TYPE,
        env.deployment.auction.address(),
    )?;
    assert!(matches!(
        env.deployment
            .ledger
            .transfer(bob.address(), carol.address(), &misbound),
        Err(ConfidentialError::ContextMismatch(_))
    ));
    assert_eq!(env.balance("bob").await?, U256::from(100));
    Ok(())
}

#[tokio::test]
async fn test_rebound_amount_keeps_balances_readable() -> Result<()> {
    let env = TestEnv::new()?;
    env.fund(&[("alice", 100), ("dave", 30)])?;
    let alice = env.client("alice")?;
    let dave = env.client("dave")?;
    let ledger = &env.deployment.ledger;

    // alice's sealed amount relabelled with dave's context so the digests check out
    let sealed = alice.encrypt(U256::from(70), cv_sdk::AMOUNT_TYPE, ledger.address())?;
    let rebound = InputCiphertext::new(sealed.ciphertext, ledger.context_for(dave.address()));
    ledger.transfer(dave.address(), alice.address(), &rebound)?;

    assert_eq!(env.balance("alice").await?, U256::from(100));
    assert_eq!(env.balance("dave").await?, U256::from(30));

    // both balances keep working afterwards
    alice.transfer(dave.address(), U256::from(10))?;
    assert_eq!(env.balance("alice").await?, U256::from(90));
    assert_eq!(env.balance("dave").await?, U256::from(40));
    assert_eq!(total_supply(&env).await?, U256::from(130));
    Ok(())
}

#[tokio::test]
async fn test_balance_disclosure_event() -> Result<()> {
    let env = TestEnv::new()?;
    env.fund(&[("dave", 64)])?;
    let ledger = &env.deployment.ledger;
    let dave = env.client("dave")?.address();
    let bob = env.client("bob")?.address();
    let owner = env.client("alice")?.address();

    assert!(matches!(
        ledger.request_balance_disclosure(bob, dave).await,
        Err(ConfidentialError::Unauthorized(_))
    ));
    assert_eq!(
        ledger.request_balance_disclosure(owner, dave).await?,
        U256::from(64)
    );

    let event = env
        .host()
        .events()
        .wait_for(
            |e| matches!(e, ChainEvent::UserBalanceDecrypted(d) if d.user == dave),
            Duration::from_secs(20),
        )
        .await?;
    assert_eq!(
        event,
        ChainEvent::UserBalanceDecrypted(UserBalanceDecrypted {
            user: dave,
            decrypted_amount: U256::from(64),
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_balance_history_grows_per_change() -> Result<()> {
    let env = TestEnv::new()?;
    env.fund(&[("carol", 10), ("carol", 15)])?;
    let carol = env.client("carol")?;
    carol.transfer(env.client("john")?.address(), U256::from(5))?;

    let history = env.deployment.ledger.history_of(&carol.address());
    assert_eq!(history.len(), 3);
    assert_eq!(history.last().copied(), carol.balance_of());
    assert_eq!(carol.disclose(history[1]).await?, U256::from(25));
    assert_eq!(carol.balance().await?, U256::from(20));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn test_any_transfer_sequence_conserves_supply(
        transfers in prop::collection::vec((0usize..5, 0usize..5, 0u64..400), 1..6)
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (total, minted) = runtime.block_on(async {
            let env = TestEnv::new()?;
            env.fund(&[("alice", 300), ("bob", 200), ("carol", 100)])?;
            run_transfers(&env, &transfers).await?;
            anyhow::Ok((total_supply(&env).await?, env.deployment.ledger.total_minted()))
        }).unwrap();
        prop_assert_eq!(total, minted);
        prop_assert_eq!(minted, U256::from(600));
    }
}
