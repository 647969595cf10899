//! Session Event System
//!
//! Lifecycle notifications for the active session. Hosts subscribe to learn
//! when the subprocess exits or the session is torn down, instead of polling.

use tokio::sync::broadcast;

use super::SessionId;
use crate::pty::Geometry;

/// Events emitted over a session's lifetime
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A session was opened
    Opened {
        session_id: SessionId,
        pid: Option<u32>,
    },
    /// The host reported a new surface geometry
    Resized {
        session_id: SessionId,
        geometry: Geometry,
    },
    /// The subprocess exited on its own
    Exited { session_id: SessionId },
    /// The session was closed and its handle released
    Closed { session_id: SessionId },
}

/// Subscription handle for receiving session events
pub struct SessionEventSubscription {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionEventSubscription {
    /// Receive the next event, waiting if necessary
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Session event subscriber lagged by {} events", count);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!("Session event subscriber lagged by {} events", count);
                }
                Err(_) => return None,
            }
        }
    }
}

/// Broadcast bus for session lifecycle events
#[derive(Clone)]
pub struct SessionEventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEventBus {
    /// Create a new event bus with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> SessionEventSubscription {
        SessionEventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: SessionEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
