//! Notification bus
//!
//! Typed publish/subscribe registry. Handlers run synchronously on the
//! publisher's context, in registration order. A panicking handler is
//! isolated so its siblings still run.

use crate::events::{EventKind, Notification};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
}

impl Subscription {
    /// Kind this subscription listens to
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

struct Entry {
    id: u64,
    kind: EventKind,
    handler: Handler,
}

/// Shared notification registry
///
/// Cloning shares the registry, so the caller can hand one clone to the
/// controller and keep another for observers.
#[derive(Clone, Default)]
pub struct NotificationBus {
    entries: Arc<Mutex<Vec<Entry>>>,
    next_id: Arc<AtomicU64>,
}

impl NotificationBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        // Handlers never run under this lock, so a poisoned registry is still consistent
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a handler for one kind
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries().push(Entry {
            id,
            kind,
            handler: Arc::new(handler),
        });
        Subscription { id, kind }
    }

    /// Forward one kind onto an unbounded channel for async observers
    ///
    /// The subscription stays registered after the receiver is dropped;
    /// sends to a closed channel are ignored.
    pub fn subscribe_channel(
        &self,
        kind: EventKind,
    ) -> (Subscription, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(kind, move |notification| {
            tx.send(notification.clone()).ok();
        });
        (subscription, rx)
    }

    /// Remove a handler. Returns false if it was already gone.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|entry| entry.id != subscription.id);
        entries.len() != before
    }

    /// Number of handlers registered for a kind
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.entries().iter().filter(|e| e.kind == kind).count()
    }

    /// Invoke every handler registered for the notification's kind
    ///
    /// Returns the number of handlers that completed without panicking.
    pub fn publish(&self, notification: &Notification) -> usize {
        let handlers: Vec<Handler> = self
            .entries()
            .iter()
            .filter(|entry| entry.kind == notification.kind)
            .map(|entry| Arc::clone(&entry.handler))
            .collect();

        let mut completed = 0;
        for handler in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(notification))) {
                Ok(()) => completed += 1,
                Err(_) => {
                    tracing::error!(
                        "Notification handler for '{}' panicked; continuing with the rest",
                        notification.kind
                    );
                }
            }
        }
        completed
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("subscribers", &self.entries().len())
            .finish()
    }
}
