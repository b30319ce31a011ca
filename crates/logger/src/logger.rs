// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cv_events::{ChainEvent, Event, EventBus};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

pub trait EventLogging: Event {
    fn log(&self, logger_name: &str);
}

/// Logs every event published on a bus
pub struct SimpleLogger;

impl SimpleLogger {
    pub fn attach<E: EventLogging>(name: &str, bus: &EventBus<E>) -> JoinHandle<()> {
        let name = name.to_owned();
        let mut receiver = bus.subscribe();
        info!(node = %name, "READY!");
        tokio::spawn(
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(event) => event.log(&name),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(me = %name, skipped, "Logger lagged behind the bus")
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
            .in_current_span(),
        )
    }
}

impl EventLogging for ChainEvent {
    fn log(&self, logger_name: &str) {
        let auction_id = match self {
            ChainEvent::AuctionCreated(e) => Some(e.auction_id),
            ChainEvent::BidPlaced(e) => Some(e.auction_id),
            ChainEvent::AuctionClosed(e) => Some(e.auction_id),
            ChainEvent::BidSettled(e) => Some(e.auction_id),
            ChainEvent::AuctionSettled(e) => Some(e.auction_id),
            _ => None,
        };
        match auction_id {
            Some(auction_id) => {
                info!(me = logger_name, evt = %self, auction_id = %auction_id, "Event Broadcasted")
            }
            None => info!(me = logger_name, evt = %self, "Event Broadcasted"),
        }
    }
}
