//! Change notifications for the presentation layer.
//!
//! Readers call [`ChangeNotifier::subscribe`] and receive one
//! [`SnapshotChanged`] per successful write or scope destruction, then pull the
//! new snapshot themselves.

use canopy_tree::ScopeId;
use parking_lot::Mutex;
use std::sync::mpsc::{Receiver, Sender, channel};

/// What happened to a scope's snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new record was written
    Written,
    /// The scope and its record were removed
    Removed,
}

/// Event indicating a scope's snapshot changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotChanged {
    pub scope: ScopeId,
    pub kind: ChangeKind,
}

/// Fan-out of change events to every live subscriber
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    subscribers: Mutex<Vec<Sender<SnapshotChanged>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> Receiver<SnapshotChanged> {
        let (tx, rx) = channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Send `change` to every subscriber, forgetting dropped receivers
    pub fn notify(&self, change: SnapshotChanged) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(change).is_ok());
        log::trace!(
            "Notified {} subscribers: {:?} {}",
            subscribers.len(),
            change.kind,
            change.scope
        );
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_reaches_all_subscribers() {
        let notifier = ChangeNotifier::new();
        let a = notifier.subscribe();
        let b = notifier.subscribe();
        let change = SnapshotChanged {
            scope: ScopeId::Window(1),
            kind: ChangeKind::Written,
        };

        notifier.notify(change);

        assert_eq!(a.try_recv().unwrap(), change);
        assert_eq!(b.try_recv().unwrap(), change);
    }

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let notifier = ChangeNotifier::new();
        let kept = notifier.subscribe();
        drop(notifier.subscribe());

        notifier.notify(SnapshotChanged {
            scope: ScopeId::Global,
            kind: ChangeKind::Removed,
        });

        assert_eq!(notifier.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }
}
