use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::model::FocusClaim;

pub type ClaimHandler = Arc<dyn Fn(&FocusClaim) + Send + Sync>;

/// Token returned by [`FocusBroadcastBus::subscribe`]; hand it back to
/// `unsubscribe` on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberToken(u64);

/// Fire-and-forget broadcast channel for focus claims.
///
/// Delivery is synchronous and in subscriber-registration order. Handlers
/// are snapshotted before invocation, so a handler may publish or
/// unsubscribe re-entrantly without deadlocking; a re-published claim for
/// the same identity is a natural no-op because its targets already
/// consider themselves focused.
#[derive(Default)]
pub struct FocusBroadcastBus {
    subscribers: Mutex<Vec<(u64, ClaimHandler)>>,
    next_token: AtomicU64,
}

impl FocusBroadcastBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriberToken
    where
        F: Fn(&FocusClaim) + Send + Sync + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.subscribers.lock() {
            guard.push((token, Arc::new(handler)));
        }
        SubscriberToken(token)
    }

    /// Remove a subscription. Unknown or already-removed tokens are ignored.
    pub fn unsubscribe(&self, token: SubscriberToken) {
        if let Ok(mut guard) = self.subscribers.lock() {
            guard.retain(|(id, _)| *id != token.0);
        }
    }

    /// Deliver a claim to every current subscriber. No queuing, no
    /// persistence; subscribers that joined mid-publish see the next claim.
    pub fn publish(&self, claim: &FocusClaim) {
        let snapshot: Vec<ClaimHandler> = match self.subscribers.lock() {
            Ok(guard) => guard.iter().map(|(_, handler)| Arc::clone(handler)).collect(),
            Err(_) => return,
        };
        for handler in snapshot {
            handler(claim);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}
