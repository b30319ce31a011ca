// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::U256;
use rand::RngCore;

/// Splits `value` into `parties` additive shares modulo 2^256.
///
/// Every subset smaller than the full set is uniformly random, so a party holding fewer than
/// `parties` shares learns nothing about the value.
pub fn split_additive<R: RngCore>(value: U256, parties: usize, rng: &mut R) -> Vec<U256> {
    let parties = parties.max(1);
    let mut shares = Vec::with_capacity(parties);
    let mut sum = U256::ZERO;
    for _ in 1..parties {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        let share = U256::from_be_bytes(bytes);
        sum = sum.wrapping_add(share);
        shares.push(share);
    }
    shares.push(value.wrapping_sub(sum));
    shares
}

/// Reconstructs a value from its complete additive share set
pub fn combine_additive(shares: &[U256]) -> U256 {
    shares
        .iter()
        .fold(U256::ZERO, |acc, share| acc.wrapping_add(*share))
}
