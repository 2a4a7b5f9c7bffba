//! Global event-bus binding
//!
//! The host owns a broadcast bus carrying global submit/reject requests
//! (typically Enter and Esc). The controller listens through a
//! [`BusSubscription`]; rebinding drops the old subscription first.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

/// Global requests routed to the active dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusSignal {
    Submit,
    Reject,
}

/// Host side of the bus
pub type EventBus = broadcast::Sender<BusSignal>;

/// Create a bus with room for `capacity` unread signals per listener
pub fn event_bus(capacity: usize) -> EventBus {
    broadcast::channel(capacity).0
}

/// Result of a non-blocking bus read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusPoll {
    Signal(BusSignal),
    Empty,
    Closed,
}

/// A live listener on a host bus
#[derive(Debug)]
pub struct BusSubscription {
    receiver: broadcast::Receiver<BusSignal>,
}

impl BusSubscription {
    pub fn subscribe(bus: &EventBus) -> Self {
        Self {
            receiver: bus.subscribe(),
        }
    }

    /// Read without waiting
    pub fn poll(&mut self) -> BusPoll {
        loop {
            match self.receiver.try_recv() {
                Ok(signal) => return BusPoll::Signal(signal),
                Err(TryRecvError::Empty) => return BusPoll::Empty,
                Err(TryRecvError::Closed) => return BusPoll::Closed,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "modal bus listener lagged, signals dropped");
                }
            }
        }
    }

    /// Wait for the next signal; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<BusSignal> {
        loop {
            match self.receiver.recv().await {
                Ok(signal) => return Some(signal),
                Err(RecvError::Closed) => return None,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "modal bus listener lagged, signals dropped");
                }
            }
        }
    }
}
