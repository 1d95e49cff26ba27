//! Session lifecycle events
//!
//! A failed renewal is unrecoverable client-side: the backend wants a full
//! login, and only the hosting application knows what that looks like (a CLI
//! exits, a UI returns to its login screen). The client broadcasts
//! `SessionEvent::Ended` exactly once per terminal failure and performs no
//! host-side action itself: no redirects, no process exit.

use tokio::sync::broadcast;

/// Events broadcast on the session channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Renewal failed terminally and the stored credentials were cleared.
    /// The host must run login again.
    Ended,
}

/// Broadcast publisher for session events.
///
/// Publishing with no subscribers is fine; the event is dropped, not an
/// error. Subscribers see every event broadcast after they subscribe.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Hand out a receiver for session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, event: SessionEvent) {
        // Err only means nobody is listening right now
        let _ = self.tx.send(event);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let events = SessionEvents::new();
        let mut rx = events.subscribe();

        events.publish(SessionEvent::Ended);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Ended);
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_panic() {
        let events = SessionEvents::new();
        events.publish(SessionEvent::Ended);
    }

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let events = SessionEvents::new();
        let mut a = events.subscribe();
        let mut b = events.subscribe();

        events.publish(SessionEvent::Ended);
        assert_eq!(a.recv().await.unwrap(), SessionEvent::Ended);
        assert_eq!(b.recv().await.unwrap(), SessionEvent::Ended);
    }

    #[tokio::test]
    async fn subscription_starts_after_past_events() {
        let events = SessionEvents::new();
        events.publish(SessionEvent::Ended);

        // A late subscriber does not replay history
        let mut rx = events.subscribe();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
