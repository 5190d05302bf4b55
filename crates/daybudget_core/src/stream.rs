//! Subscriber fan-out shared by the stores and the budget aggregator.
//!
//! # Responsibility
//! - Hand out `flume` receivers that start with the current value.
//! - Push freshly rendered values to every live subscriber.
//!
//! # Invariants
//! - A subscriber whose receiver was dropped is removed on the next publish.
//! - Callers serialize `subscribe` and `publish_with` with their own state
//!   lock, so no subscriber can miss a change between its initial value and
//!   registration.

use flume::{Receiver, Sender};
use parking_lot::Mutex;

/// Registry of subscribers, each keyed by the query it watches.
pub struct Subscribers<Q, T> {
    entries: Mutex<Vec<(Q, Sender<T>)>>,
}

impl<Q, T> Default for Subscribers<Q, T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<Q, T> Subscribers<Q, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and queues `initial` as its first value.
    pub fn subscribe(&self, query: Q, initial: T) -> Receiver<T> {
        let (tx, rx) = flume::unbounded();
        // The receiver is still alive here, so this send cannot fail.
        let _ = tx.send(initial);
        self.entries.lock().push((query, tx));
        rx
    }

    /// Renders a value per live subscriber and sends it.
    ///
    /// `render` returning `None` skips that subscriber for this round.
    /// Returns the number of subscribers that received a value.
    pub fn publish_with(&self, mut render: impl FnMut(&Q) -> Option<T>) -> usize {
        let mut entries = self.entries.lock();
        entries.retain(|(_, tx)| !tx.is_disconnected());

        let mut delivered = 0;
        entries.retain(|(query, tx)| match render(query) {
            Some(value) => match tx.send(value) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            },
            None => true,
        });
        delivered
    }

    /// Returns the number of registered subscribers, including ones whose
    /// receivers were dropped since the last publish.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Subscribers;

    #[test]
    fn subscribe_delivers_initial_value_then_updates() {
        let subscribers: Subscribers<(), u32> = Subscribers::new();
        let rx = subscribers.subscribe((), 1);

        assert_eq!(subscribers.publish_with(|_| Some(2)), 1);
        assert_eq!(rx.try_recv().unwrap(), 1);
        assert_eq!(rx.try_recv().unwrap(), 2);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let subscribers: Subscribers<u8, u32> = Subscribers::new();
        let kept = subscribers.subscribe(1, 0);
        drop(subscribers.subscribe(2, 0));

        assert_eq!(subscribers.publish_with(|query| Some(u32::from(*query))), 1);
        assert_eq!(subscribers.len(), 1);
        assert_eq!(kept.try_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn render_none_keeps_subscriber() {
        let subscribers: Subscribers<(), u32> = Subscribers::new();
        let _rx = subscribers.subscribe((), 0);
        assert_eq!(subscribers.publish_with(|_| None), 0);
        assert_eq!(subscribers.len(), 1);
    }
}
