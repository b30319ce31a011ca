// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Content identifier of an emitted chain event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub [u8; 32]);

impl EventId {
    /// Derives the id from the event's canonical bytes and its position in the chain log, so two
    /// events with equal payloads still get distinct ids.
    pub fn derive(event_type: &str, sequence: u64, payload: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(event_type.as_bytes());
        hasher.update(sequence.to_be_bytes());
        hasher.update(payload);
        EventId(hasher.finalize().into())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base58_string = bs58::encode(&self.0).into_string();
        write!(f, "evt:{}", &base58_string[0..8])
    }
}
