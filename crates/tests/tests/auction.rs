// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::U256;
use anyhow::Result;
use cv_auction::{required_escrow, AuctionState};
use cv_events::{
    AuctionId, AuctionSettled, BidSettled, ChainEvent, ConfidentialError, InputCiphertext,
    Operation,
};
use cv_sdk::{Outcome, BID_TYPE};
use cv_test_helpers::{dev_funds, init_test_logging, TestEnv, TestEnvBuilder};

const DURATION: u64 = 3_600;

/// Alice sells `supply` tokens with the given floor price
async fn open_auction(env: &TestEnv, supply: u64, min_price: u64) -> Result<AuctionId> {
    env.fund(&[("alice", supply)])?;
    let alice = env.client("alice")?;
    alice.approve_auction();
    Ok(alice
        .create_auction(U256::from(supply), DURATION, U256::from(min_price))
        .await?)
}

fn escrow() -> U256 {
    BID_TYPE.max() * BID_TYPE.max()
}

fn settled_events(env: &TestEnv, id: AuctionId) -> Vec<AuctionSettled> {
    env.host()
        .events()
        .history_of("AuctionSettled")
        .into_iter()
        .filter_map(|e| match e {
            ChainEvent::AuctionSettled(s) if s.auction_id == id => Some(s),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_uniform_price_clearing() -> Result<()> {
    let _guard = init_test_logging();
    let env = TestEnvBuilder::new().with_logging().build()?;
    let id = open_auction(&env, 1_000, 2).await?;
    env.client("bob")?.place_bid(id, U256::from(500), U256::from(2))?;
    env.client("carol")?.place_bid(id, U256::from(600), U256::from(8))?;

    env.advance(DURATION);
    let settlement = env.client("john")?.end_auction(id).await?;

    assert_eq!(settlement.clearing_price, U256::from(2));
    assert_eq!(settlement.total_quantity_sold, U256::from(1_000));
    assert_eq!(settlement.fills, vec![U256::from(400), U256::from(600)]);
    assert_eq!(
        settlement.refunds,
        vec![escrow() - U256::from(800), escrow() - U256::from(1_200)]
    );
    assert_eq!(settlement.proceeds, U256::from(2_000));

    assert_eq!(env.balance("bob").await?, U256::from(400));
    assert_eq!(env.balance("carol").await?, U256::from(600));
    assert_eq!(env.balance("alice").await?, U256::ZERO);

    assert_eq!(
        settled_events(&env, id),
        vec![AuctionSettled {
            auction_id: id,
            clearing_price: U256::from(2),
            total_quantity_sold: U256::from(1_000),
        }]
    );
    let bid_settled: Vec<_> = env
        .host()
        .events()
        .history_of("BidSettled")
        .into_iter()
        .filter_map(|e| match e {
            ChainEvent::BidSettled(b) => Some(b),
            _ => None,
        })
        .collect();
    assert_eq!(
        bid_settled,
        vec![
            BidSettled {
                auction_id: id,
                bidder: env.client("bob")?.address(),
                bid_index: 0,
                quantity_filled: U256::from(400),
                refund: escrow() - U256::from(800),
            },
            BidSettled {
                auction_id: id,
                bidder: env.client("carol")?.address(),
                bid_index: 1,
                quantity_filled: U256::from(600),
                refund: escrow() - U256::from(1_200),
            },
        ]
    );
    assert_eq!(
        env.deployment.auction.state_of(id),
        Some(AuctionState::Settled)
    );

    // escrow beyond what the fill cost comes back, the creator is paid the proceeds
    assert_eq!(
        env.client("bob")?.native_balance(),
        dev_funds() - U256::from(800)
    );
    assert_eq!(
        env.client("carol")?.native_balance(),
        dev_funds() - U256::from(1_200)
    );
    assert_eq!(
        env.client("alice")?.native_balance(),
        dev_funds() + U256::from(2_000)
    );
    Ok(())
}

#[tokio::test]
async fn test_equal_prices_fill_in_bid_order() -> Result<()> {
    let env = TestEnv::new()?;
    let id = open_auction(&env, 100, 1).await?;
    env.client("bob")?.place_bid(id, U256::from(70), U256::from(5))?;
    env.client("carol")?.place_bid(id, U256::from(70), U256::from(5))?;
    env.client("dave")?.place_bid(id, U256::from(10), U256::from(3))?;

    let settlement = env.client("alice")?.end_auction(id).await?;
    assert_eq!(settlement.clearing_price, U256::from(5));
    assert_eq!(
        settlement.fills,
        vec![U256::from(70), U256::from(30), U256::ZERO]
    );
    assert_eq!(env.balance("dave").await?, U256::ZERO);
    Ok(())
}

#[tokio::test]
async fn test_empty_auction_returns_supply() -> Result<()> {
    let env = TestEnv::new()?;
    let id = open_auction(&env, 250, 7).await?;
    env.advance(DURATION);

    let result = env.client("bob")?.end_auction(id).await;
    assert!(matches!(result, Err(ConfidentialError::NoBids(i)) if i == id));

    assert_eq!(
        settled_events(&env, id),
        vec![AuctionSettled {
            auction_id: id,
            clearing_price: U256::from(7),
            total_quantity_sold: U256::ZERO,
        }]
    );
    assert_eq!(env.balance("alice").await?, U256::from(250));
    assert_eq!(
        env.deployment.auction.state_of(id),
        Some(AuctionState::Settled)
    );
    Ok(())
}

#[tokio::test]
async fn test_end_auction_is_effective_once() -> Result<()> {
    let env = TestEnv::new()?;
    let id = open_auction(&env, 10, 1).await?;
    env.client("bob")?.place_bid(id, U256::from(4), U256::from(3))?;
    env.advance(DURATION);

    let carol = env.client("carol")?;
    let dave = env.client("dave")?;
    let (first, second) = tokio::join!(carol.end_auction(id), dave.end_auction(id));
    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(ConfidentialError::AuctionAlreadySettled(_)))));

    assert!(matches!(
        env.client("john")?.end_auction(id).await,
        Err(ConfidentialError::AuctionAlreadySettled(_))
    ));
    assert_eq!(settled_events(&env, id).len(), 1);
    assert_eq!(env.balance("bob").await?, U256::from(4));
    assert_eq!(env.balance("alice").await?, U256::from(6));
    Ok(())
}

#[tokio::test]
async fn test_failed_clearing_can_be_repeated() -> Result<()> {
    let env = TestEnv::new()?;
    let id = open_auction(&env, 10, 1).await?;
    env.client("bob")?.place_bid(id, U256::from(10), U256::from(2))?;
    env.network.synced().await;

    env.network.set_available(false);
    let alice = env.client("alice")?;
    assert!(matches!(
        alice.end_auction(id).await,
        Err(ConfidentialError::DisclosureUnavailable(_))
    ));
    assert_eq!(
        env.deployment.auction.state_of(id),
        Some(AuctionState::Closed)
    );
    assert!(settled_events(&env, id).is_empty());
    assert_eq!(env.balance("bob").await?, U256::ZERO);

    env.network.set_available(true);
    let settlement = alice.end_auction(id).await?;
    assert_eq!(settlement.total_quantity_sold, U256::from(10));
    assert_eq!(settlement.clearing_price, U256::from(2));
    assert_eq!(env.balance("bob").await?, U256::from(10));
    Ok(())
}

#[tokio::test]
async fn test_bidding_rules() -> Result<()> {
    let env = TestEnv::new()?;
    let id = open_auction(&env, 10, 1).await?;
    let bob = env.client("bob")?;
    let engine = &env.deployment.auction;

    let quantity = bob.encrypt(U256::from(3), BID_TYPE, engine.address())?;
    let price = bob.encrypt(U256::from(3), BID_TYPE, engine.address())?;
    let short = required_escrow(&quantity, &price) - U256::from(1);
    assert!(matches!(
        engine.place_bid(bob.address(), id, &quantity, &price, short),
        Err(ConfidentialError::InsufficientEscrow { .. })
    ));

    // bound to the ledger instead of the auction
    let ledger = env.deployment.ledger.address();
    let misbound_quantity = bob.encrypt(U256::from(3), BID_TYPE, ledger)?;
    let misbound_price = bob.encrypt(U256::from(3), BID_TYPE, ledger)?;
    assert!(matches!(
        engine.place_bid(
            bob.address(),
            id,
            &misbound_quantity,
            &misbound_price,
            escrow()
        ),
        Err(ConfidentialError::ContextMismatch(_))
    ));

    assert!(matches!(
        bob.end_auction(id).await,
        Err(ConfidentialError::DeadlineNotReached(_))
    ));

    env.advance(DURATION);
    assert!(matches!(
        bob.place_bid(id, U256::from(1), U256::from(1)),
        Err(ConfidentialError::AuctionNotOpen(_))
    ));
    assert!(matches!(
        bob.place_bid(AuctionId::new(99), U256::from(1), U256::from(1)),
        Err(ConfidentialError::AuctionNotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_auction_through_operations() -> Result<()> {
    let env = TestEnv::new()?;
    env.fund(&[("alice", 40)])?;
    let alice = env.client("alice")?;
    let bob = env.client("bob")?;
    alice.approve_auction();

    let Outcome::AuctionCreated(id) = alice
        .submit(Operation::CreateAuction {
            token: env.deployment.ledger.address(),
            supply: U256::from(40),
            duration_secs: DURATION,
            min_price: U256::from(1),
        })
        .await?
    else {
        panic!("auction id expected");
    };

    let auction = env.deployment.auction.address();
    let quantity = bob.encrypt(U256::from(15), BID_TYPE, auction)?;
    let price = bob.encrypt(U256::from(9), BID_TYPE, auction)?;
    let outcome = bob
        .submit(Operation::PlaceBid {
            auction_id: id,
            escrow: required_escrow(&quantity, &price),
            quantity,
            price,
        })
        .await?;
    assert_eq!(outcome, Outcome::BidPlaced(0));

    env.advance(DURATION);
    let Outcome::AuctionSettled(settlement) = bob
        .submit(Operation::EndAuction { auction_id: id })
        .await?
    else {
        panic!("settlement expected");
    };
    assert_eq!(settlement.total_quantity_sold, U256::from(15));
    assert_eq!(settlement.clearing_price, U256::from(1));
    assert_eq!(env.balance("alice").await?, U256::from(25));
    Ok(())
}

#[tokio::test]
async fn test_rebound_bid_cannot_block_clearing() -> Result<()> {
    let env = TestEnv::new()?;
    let id = open_auction(&env, 100, 1).await?;
    let bob = env.client("bob")?;
    let carol = env.client("carol")?;
    let engine = &env.deployment.auction;

    // carol's sealed values relabelled as bob's
    let rebind = |input: InputCiphertext| {
        InputCiphertext::new(input.ciphertext, engine.context_for(bob.address()))
    };
    let quantity = rebind(carol.encrypt(U256::from(100), BID_TYPE, engine.address())?);
    let price = rebind(carol.encrypt(U256::from(90), BID_TYPE, engine.address())?);
    assert_eq!(
        engine.place_bid(bob.address(), id, &quantity, &price, escrow()),
        Ok(0)
    );
    carol.place_bid(id, U256::from(60), U256::from(3))?;
    env.advance(DURATION);

    let settlement = env.client("john")?.end_auction(id).await?;
    assert_eq!(settlement.fills, vec![U256::ZERO, U256::from(60)]);
    assert_eq!(settlement.clearing_price, U256::from(1));
    assert_eq!(env.balance("bob").await?, U256::ZERO);
    assert_eq!(env.balance("carol").await?, U256::from(60));
    assert_eq!(env.balance("alice").await?, U256::from(40));
    assert_eq!(bob.native_balance(), dev_funds());
    Ok(())
}

#[tokio::test]
async fn test_unfunded_auction_cannot_spend_other_escrow() -> Result<()> {
    let env = TestEnv::new()?;
    let bob = env.client("bob")?;
    bob.approve_auction();
    assert!(matches!(
        bob.create_auction(U256::from(1_000), DURATION, U256::from(1))
            .await,
        Err(ConfidentialError::SupplyNotCovered { .. })
    ));

    let id = open_auction(&env, 1_000, 1).await?;
    assert_eq!(id, AuctionId::new(0));
    env.client("dave")?
        .place_bid(id, U256::from(1_000), U256::from(5))?;
    env.advance(DURATION);

    let settlement = env.client("john")?.end_auction(id).await?;
    assert_eq!(settlement.total_quantity_sold, U256::from(1_000));
    assert_eq!(env.balance("dave").await?, U256::from(1_000));
    assert_eq!(env.balance("bob").await?, U256::ZERO);
    Ok(())
}

#[tokio::test]
async fn test_rejected_bid_can_be_resubmitted() -> Result<()> {
    let env = TestEnv::new()?;
    let id = open_auction(&env, 10, 1).await?;
    let bob = env.client("bob")?;
    let engine = &env.deployment.auction;

    let quantity = bob.encrypt(U256::from(4), BID_TYPE, engine.address())?;
    let spent_price = bob.encrypt(U256::from(2), BID_TYPE, engine.address())?;
    env.host()
        .verify_input(engine.address(), bob.address(), &spent_price)?;
    assert_eq!(
        engine.place_bid(bob.address(), id, &quantity, &spent_price, escrow()),
        Err(ConfidentialError::InputAlreadyConsumed(spent_price.handle))
    );
    assert_eq!(bob.native_balance(), dev_funds());

    let price = bob.encrypt(U256::from(2), BID_TYPE, engine.address())?;
    assert_eq!(
        engine.place_bid(bob.address(), id, &quantity, &price, escrow()),
        Ok(0)
    );
    assert_eq!(bob.native_balance(), dev_funds() - escrow());
    Ok(())
}
