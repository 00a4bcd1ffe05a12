use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::agent::{SessionEvent, SessionId};

/// Per-session ordered fan-out of lifecycle events.
///
/// Every subscriber owns an unbounded queue, so a slow observer never delays
/// delivery to the others. Events published before a subscription exists are
/// not replayed.
pub struct EventBus {
    subscribers: DashMap<SessionId, Vec<mpsc::UnboundedSender<SessionEvent>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    pub fn subscribe(&self, session_id: &SessionId) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .entry(session_id.clone())
            .or_default()
            .push(tx);
        log::debug!("[{}] New event subscriber", session_id);

        Subscription {
            session_id: session_id.clone(),
            rx,
        }
    }

    /// Delivers `event` to every live subscriber of the session, in publish order.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, session_id: &SessionId, event: impl Into<SessionEvent>) -> usize {
        let event = event.into();

        let Some(mut senders) = self.subscribers.get_mut(session_id) else {
            return 0;
        };
        senders.retain(|tx| tx.send(event.clone()).is_ok());
        let delivered = senders.len();
        drop(senders);

        if delivered == 0 {
            self.subscribers
                .remove_if(session_id, |_, senders| senders.is_empty());
        }
        delivered
    }

    pub fn subscriber_count(&self, session_id: &SessionId) -> usize {
        self.subscribers
            .get(session_id)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

/// Receiving half of a session subscription; dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    session_id: SessionId,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Subscription {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }

    /// Everything queued so far, without waiting.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}
