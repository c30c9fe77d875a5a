//! Per-session broadcast registry

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use rollcall_core::{SessionEvent, SessionId};

/// Default per-session channel capacity
pub const DEFAULT_CAPACITY: usize = 64;

/// Live subscription to one session's event stream.
///
/// Dropping the observer unsubscribes it. A reconnecting observer must
/// subscribe again and only sees future events.
pub struct Observer {
    session: SessionId,
    receiver: broadcast::Receiver<SessionEvent>,
}

impl Observer {
    /// Session this observer is attached to
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Next event, or `None` once the session channel is gone.
    ///
    /// An observer that fell behind the channel capacity loses the oldest
    /// events; the gap is logged and delivery continues with what remains.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(session = %self.session, skipped, "observer lagged, dropped events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of `recv`; `None` when no event is ready
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(session = %self.session, skipped, "observer lagged, dropped events");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer").field("session", &self.session).finish()
    }
}

/// Per-session publish/subscribe registry
pub struct EventBus {
    capacity: usize,
    sessions: RwLock<HashMap<SessionId, broadcast::Sender<SessionEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Channel capacity bounds how far an observer may fall behind before
    /// it starts losing the oldest events
    pub fn with_capacity(capacity: usize) -> Self {
        EventBus {
            capacity: capacity.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Attach an observer to a session's event stream
    pub fn subscribe(&self, session: SessionId) -> Observer {
        let receiver = {
            let sessions = self.sessions.read();
            sessions.get(&session).map(|sender| sender.subscribe())
        };
        let receiver = receiver.unwrap_or_else(|| {
            let mut sessions = self.sessions.write();
            sessions
                .entry(session)
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe()
        });

        Observer { session, receiver }
    }

    /// Detach an observer. Equivalent to dropping it.
    pub fn unsubscribe(&self, observer: Observer) {
        drop(observer);
    }

    /// Fan an event out to every observer of a session.
    ///
    /// Fire-and-forget: returns how many observers the event reached. With
    /// no observers attached this is a no-op and the idle channel is
    /// garbage-collected.
    pub fn publish(&self, session: SessionId, event: SessionEvent) -> usize {
        let sender = {
            let sessions = self.sessions.read();
            sessions.get(&session).cloned()
        };
        let Some(sender) = sender else {
            return 0;
        };

        match sender.send(event) {
            Ok(reached) => reached,
            Err(_) => {
                // Last observer left between lookup and send
                let mut sessions = self.sessions.write();
                if let Some(sender) = sessions.get(&session) {
                    if sender.receiver_count() == 0 {
                        sessions.remove(&session);
                    }
                }
                0
            }
        }
    }

    /// Number of observers currently attached to a session
    pub fn observer_count(&self, session: SessionId) -> usize {
        self.sessions
            .read()
            .get(&session)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("sessions", &self.sessions.read().len())
            .finish()
    }
}
