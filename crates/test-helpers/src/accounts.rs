// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use cv_crypto::Wallet;
use rand::rngs::OsRng;
use rand::RngCore;

// Well known development keys, funded on every local EVM node
const DEV_KEYS: [(&str, &str); 5] = [
    (
        "alice",
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    ),
    (
        "bob",
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    ),
    (
        "carol",
        "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    ),
    (
        "dave",
        "0x7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
    ),
    (
        "john",
        "0x47e179ec197488593b187f80a00eb0da91f1c9b0b13d8733f8dce4c8b19b1a1c",
    ),
];

pub const ACCOUNT_NAMES: [&str; 5] = ["alice", "bob", "carol", "dave", "john"];

/// Deterministic wallet for one of the named test accounts
pub fn named_wallet(name: &str) -> Option<Wallet> {
    DEV_KEYS
        .iter()
        .find(|(n, _)| *n == name)
        .and_then(|(_, key)| Wallet::from_hex(key).ok())
}

pub fn rand_address() -> Address {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    Address::from(bytes)
}
