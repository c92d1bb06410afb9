//! Snapshot transport - the subscription seam and an in-process bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::TransportError;
use crate::pipeline::SnapshotSender;
use crate::types::SharedSnapshot;

/// Handle for one active subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
  fn next() -> Self {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    Self(COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  pub fn raw(&self) -> u64 {
    self.0
  }
}

/// Source of octree snapshots, keyed by topic.
///
/// Implementations call [`SnapshotSender::deliver`] from whatever thread
/// receives the data. Delivery must not wait on decoding.
pub trait SnapshotTransport: Send + Sync {
  fn subscribe(&self, topic: &str, sender: SnapshotSender)
    -> Result<SubscriptionId, TransportError>;

  /// Stop delivering to `id`. Unknown ids are ignored.
  fn unsubscribe(&self, id: SubscriptionId);
}

/// In-process publish/subscribe bus.
#[derive(Default)]
pub struct LocalBus {
  topics: Mutex<HashMap<String, Vec<(SubscriptionId, SnapshotSender)>>>,
}

impl LocalBus {
  pub fn new() -> Self {
    Self::default()
  }

  /// Deliver `snapshot` to every subscriber of `topic`. Returns how many
  /// subscribers received it.
  pub fn publish(&self, topic: &str, snapshot: impl Into<SharedSnapshot>) -> usize {
    let senders: Vec<SnapshotSender> = {
      let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
      match topics.get(topic) {
        Some(subscribers) => subscribers.iter().map(|(_, s)| s.clone()).collect(),
        None => return 0,
      }
    };
    let snapshot = snapshot.into();
    for sender in &senders {
      sender.deliver(SharedSnapshot::clone(&snapshot));
    }
    senders.len()
  }

  /// Number of subscribers on `topic`.
  pub fn subscriber_count(&self, topic: &str) -> usize {
    self
      .topics
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(topic)
      .map_or(0, Vec::len)
  }
}

impl SnapshotTransport for LocalBus {
  fn subscribe(
    &self,
    topic: &str,
    sender: SnapshotSender,
  ) -> Result<SubscriptionId, TransportError> {
    if topic.trim().is_empty() {
      return Err(TransportError::EmptyTopic);
    }
    let id = SubscriptionId::next();
    self
      .topics
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .entry(topic.to_string())
      .or_default()
      .push((id, sender));
    Ok(id)
  }

  fn unsubscribe(&self, id: SubscriptionId) {
    let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
    for subscribers in topics.values_mut() {
      subscribers.retain(|(sub, _)| *sub != id);
    }
    topics.retain(|_, subscribers| !subscribers.is_empty());
  }
}
