//! # Change Feed
//!
//! In-process analog of the live-query subscriptions the web frontend
//! binds to. Repositories publish an event after every successful write;
//! any number of sessions subscribe per `(organization, collection)` pair
//! and re-query on notification.
//!
//! ## Reference Counting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                ChangeFeed (one per Database)                            │
//! │                                                                         │
//! │   ("org-1", Orders) ──► broadcast channel ──► subscriber A             │
//! │                                          └──► subscriber B             │
//! │   ("org-1", Tables) ──► broadcast channel ──► subscriber A             │
//! │   ("org-2", Orders) ──► broadcast channel ──► subscriber C             │
//! │                                                                         │
//! │   One channel per key, no matter how many components subscribe.        │
//! │   Dropping the last subscription for a key tears the channel down.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is an explicit, injectable service with `subscribe() → handle` /
//! drop-to-close lifecycle: the deduplication lives in one place instead
//! of hidden module-level listener maps. Publishing to a key nobody
//! watches is a no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Buffered events per channel before slow subscribers start lagging.
/// A lagging subscriber skips ahead; events carry ids, not payloads, so a
/// skipped event only costs a redundant re-query.
const FEED_CAPACITY: usize = 64;

// =============================================================================
// Events
// =============================================================================

/// The collections a session can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Categories,
    Products,
    Services,
    Tables,
    Customers,
    Orders,
    Invoices,
    Settings,
}

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

/// A write notification. Carries identifiers only; subscribers re-query
/// for current state, which keeps every session converging on whatever
/// the database now holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub org_id: String,
    pub collection: Collection,
    pub entity_id: String,
    pub action: ChangeAction,
}

// =============================================================================
// Feed
// =============================================================================

type FeedKey = (String, Collection);

struct FeedEntry {
    sender: broadcast::Sender<ChangeEvent>,
    subscribers: usize,
}

/// Reference-counted registry of broadcast channels keyed by
/// `(org_id, collection)`.
///
/// A cheap clone handle over shared state: the `Database`, every
/// repository and every live [`FeedSubscription`] hold clones of the
/// same registry.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    inner: Arc<FeedInner>,
}

#[derive(Default)]
struct FeedInner {
    channels: Mutex<HashMap<FeedKey, FeedEntry>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        ChangeFeed::default()
    }

    /// Opens a subscription for one organization's collection.
    ///
    /// Subscriptions to the same key share a single channel. The channel
    /// exists from the first subscribe until the last handle drops.
    pub fn subscribe(&self, org_id: &str, collection: Collection) -> FeedSubscription {
        let key = (org_id.to_string(), collection);
        let mut channels = self
            .inner
            .channels
            .lock()
            .expect("change feed mutex poisoned");

        let entry = channels.entry(key.clone()).or_insert_with(|| {
            debug!(org_id = %org_id, collection = ?collection, "Opening feed channel");
            let (sender, _) = broadcast::channel(FEED_CAPACITY);
            FeedEntry {
                sender,
                subscribers: 0,
            }
        });
        entry.subscribers += 1;
        let receiver = entry.sender.subscribe();
        drop(channels);

        FeedSubscription {
            feed: self.clone(),
            key,
            receiver,
        }
    }

    /// Publishes a write notification.
    ///
    /// A key with no subscribers has no channel; the event is dropped
    /// without allocation.
    pub fn publish(&self, event: ChangeEvent) {
        let key = (event.org_id.clone(), event.collection);
        let channels = self
            .inner
            .channels
            .lock()
            .expect("change feed mutex poisoned");
        if let Some(entry) = channels.get(&key) {
            // Send only fails when every receiver is gone, which is fine:
            // the entry is about to be released by those drops.
            let _ = entry.sender.send(event);
        }
    }

    /// Number of live channels (distinct watched keys). Diagnostics only.
    pub fn active_channels(&self) -> usize {
        self.inner
            .channels
            .lock()
            .expect("change feed mutex poisoned")
            .len()
    }

    fn release(&self, key: &FeedKey) {
        let mut channels = self
            .inner
            .channels
            .lock()
            .expect("change feed mutex poisoned");
        if let Some(entry) = channels.get_mut(key) {
            entry.subscribers -= 1;
            if entry.subscribers == 0 {
                debug!(org_id = %key.0, collection = ?key.1, "Closing feed channel");
                channels.remove(key);
            }
        }
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("active_channels", &self.active_channels())
            .finish()
    }
}

// =============================================================================
// Subscription Handle
// =============================================================================

/// A live subscription. Dropping it unsubscribes; the underlying channel
/// is torn down when the last handle for its key drops.
pub struct FeedSubscription {
    feed: ChangeFeed,
    key: FeedKey,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl FeedSubscription {
    /// Waits for the next event.
    ///
    /// Returns `None` once the channel is closed. A subscriber that fell
    /// behind skips the missed events and keeps going (they only signal
    /// "re-query", so skipping is harmless).
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking poll for a pending event.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.feed.release(&self.key);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
