// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cv_utils::{Backoff, BACKOFF_DELAY, BACKOFF_MAX_DELAY, BACKOFF_MAX_RETRIES};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing of the disclosure round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisclosureConfig {
    /// Upper bound for a single request to the decryption network
    pub request_timeout_ms: u64,
    /// Attempt ceiling for transient network failures
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// How long to keep polling a handle that is not computed yet
    pub ready_timeout_ms: u64,
    pub ready_poll_ms: u64,
}

impl Default for DisclosureConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            max_attempts: BACKOFF_MAX_RETRIES,
            initial_backoff_ms: BACKOFF_DELAY,
            max_backoff_ms: BACKOFF_MAX_DELAY,
            ready_timeout_ms: 20_000,
            ready_poll_ms: 250,
        }
    }
}

impl DisclosureConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            self.max_attempts,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms.max(1))
    }

    /// Short timings for in-process networks and tests
    pub fn fast() -> Self {
        Self {
            request_timeout_ms: 1_000,
            max_attempts: 3,
            initial_backoff_ms: 10,
            max_backoff_ms: 50,
            ready_timeout_ms: 5_000,
            ready_poll_ms: 10,
        }
    }
}
