// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::U256;
use anyhow::Result;
use cv_events::{ConfidentialError, Context, ValueType};
use cv_test_helpers::{rand_address, TestEnv};
use proptest::prelude::*;

/// Encrypts as `name` to the ledger, lands the input on chain and reads it back
async fn round_trip(env: &TestEnv, name: &str, value: U256, ty: ValueType) -> Result<U256> {
    let client = env.client(name)?;
    let ledger = env.deployment.ledger.address();
    let input = client.encrypt(value, ty, ledger)?;
    let handle = env.host().verify_input(ledger, client.address(), &input)?;
    Ok(client.disclose(handle).await?)
}

#[tokio::test]
async fn test_round_trip_every_width() -> Result<()> {
    let env = TestEnv::new()?;
    for ty in [
        ValueType::Uint4,
        ValueType::Uint8,
        ValueType::Uint16,
        ValueType::Uint32,
        ValueType::Uint64,
        ValueType::Uint128,
        ValueType::Uint160,
        ValueType::Uint256,
    ] {
        for value in [U256::ZERO, U256::from(1), ty.max()] {
            assert_eq!(round_trip(&env, "bob", value, ty).await?, value, "{ty:?}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_value_is_rejected() -> Result<()> {
    let env = TestEnv::new()?;
    let bob = env.client("bob")?;
    let result = bob.encrypt(U256::from(256), ValueType::Uint8, env.deployment.ledger.address());
    assert!(matches!(result, Err(ConfidentialError::EncodingError(_))));
    Ok(())
}

#[tokio::test]
async fn test_context_binding() -> Result<()> {
    let env = TestEnv::new()?;
    let bob = env.client("bob")?;
    let carol = env.client("carol")?;
    let ledger = env.deployment.ledger.address();
    let auction = env.deployment.auction.address();
    let input = bob.encrypt(U256::from(77), ValueType::Uint64, ledger)?;

    // submitted to the wrong contract or by the wrong user
    assert!(matches!(
        env.host().verify_input(auction, bob.address(), &input),
        Err(ConfidentialError::ContextMismatch(_))
    ));
    assert!(matches!(
        env.host().verify_input(ledger, carol.address(), &input),
        Err(ConfidentialError::ContextMismatch(_))
    ));

    let handle = env.host().verify_input(ledger, bob.address(), &input)?;
    let disclosure = &env.deployment.disclosure;
    let chain_id = env.host().chain_id();
    let wrong_chain = Context::new(chain_id + 1, ledger, bob.address());
    let wrong_contract = Context::new(chain_id, auction, bob.address());
    let wrong_user = Context::new(chain_id, ledger, carol.address());
    let stranger = Context::new(chain_id, ledger, rand_address());

    for requester in [wrong_chain, wrong_contract] {
        assert!(matches!(
            disclosure.disclose(handle, &requester, bob.wallet()).await,
            Err(ConfidentialError::ContextMismatch(_))
        ));
    }
    assert!(matches!(
        disclosure.disclose(handle, &wrong_user, bob.wallet()).await,
        Err(ConfidentialError::Unauthorized(_))
    ));
    assert!(matches!(
        disclosure.disclose(handle, &wrong_user, carol.wallet()).await,
        Err(ConfidentialError::Unauthorized(_))
    ));
    assert!(matches!(
        disclosure.disclose(handle, &stranger, bob.wallet()).await,
        Err(ConfidentialError::Unauthorized(_))
    ));
    assert!(matches!(
        carol.disclose(handle).await,
        Err(ConfidentialError::Unauthorized(_))
    ));

    assert_eq!(bob.disclose(handle).await?, U256::from(77));
    Ok(())
}

#[tokio::test]
async fn test_input_is_consumed_once() -> Result<()> {
    let env = TestEnv::new()?;
    let bob = env.client("bob")?;
    let ledger = env.deployment.ledger.address();
    let input = bob.encrypt(U256::from(5), ValueType::Uint32, ledger)?;
    env.host().verify_input(ledger, bob.address(), &input)?;
    assert!(matches!(
        env.host().verify_input(ledger, bob.address(), &input),
        Err(ConfidentialError::InputAlreadyConsumed(_))
    ));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_round_trip_any_u64(value in any::<u64>()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let disclosed = runtime.block_on(async {
            let env = TestEnv::new()?;
            round_trip(&env, "dave", U256::from(value), ValueType::Uint64).await
        });
        prop_assert_eq!(disclosed.unwrap(), U256::from(value));
    }
}
