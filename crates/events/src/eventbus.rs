// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Event, EventId};
use anyhow::{bail, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;
use tracing::info;

//////////////////////////////////////////////////////////////////////////////
// Configuration
//////////////////////////////////////////////////////////////////////////////

/// Configuration for EventBus behavior
pub struct EventBusConfig {
    /// Events buffered per subscriber before slow subscribers start lagging
    pub capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

//////////////////////////////////////////////////////////////////////////////
// EventBus Implementation
//////////////////////////////////////////////////////////////////////////////

/// Chain event log. Contracts publish into it in execution order; clients subscribe to it or
/// wait for a matching event with a deadline.
pub struct EventBus<E: Event> {
    sender: broadcast::Sender<E>,
    history: Arc<Mutex<Vec<E>>>,
}

impl<E: Event> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            history: self.history.clone(),
        }
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

impl<E: Event> EventBus<E> {
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.capacity.max(1));
        Self {
            sender,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock_history(&self) -> MutexGuard<'_, Vec<E>> {
        // a panic while holding the lock cannot leave the log half written
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn publish(&self, event: impl Into<E>) -> EventId {
        let event = event.into();
        let id = {
            let mut history = self.lock_history();
            let id = EventId::derive(&event.event_type(), history.len() as u64, &event.payload());
            history.push(event.clone());
            // sent under the lock so subscribers observe the same order as the history
            let _ = self.sender.send(event.clone());
            id
        };
        info!(event_id = %id, ">>> {}", event);
        id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Every event published so far, in order
    pub fn history(&self) -> Vec<E> {
        self.lock_history().clone()
    }

    /// Events of the given type published so far
    pub fn history_of(&self, event_type: &str) -> Vec<E> {
        self.lock_history()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    /// Resolves with the first event, past or future, matching `predicate`.
    ///
    /// Fails once `timeout` has elapsed without a match rather than waiting indefinitely.
    pub async fn wait_for<F>(&self, predicate: F, timeout: Duration) -> Result<E>
    where
        F: Fn(&E) -> bool,
    {
        let mut receiver = {
            let history = self.lock_history();
            if let Some(found) = history.iter().find(|e| predicate(e)) {
                return Ok(found.clone());
            }
            self.sender.subscribe()
        };

        let deadline = Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, receiver.recv()).await {
                Ok(Ok(event)) if predicate(&event) => return Ok(event),
                Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => continue,
                Ok(Err(RecvError::Closed)) => bail!("event bus closed"),
                Err(_) => bail!("timed out after {:?} waiting for event", timeout),
            }
        }
    }
}
