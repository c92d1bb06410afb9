//! Inbound snapshot queue - bounded, drop-oldest, never blocks the producer.
//!
//! ```text
//!   transport ──deliver()──► [ s3 | s4 | s5 ]  capacity = queue_size
//!                              ▲
//!                  s2 dropped ─┘  (queue was full when s5 arrived)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{self as channel, Receiver, Sender, TrySendError};

use super::worker::DecodeWorker;
use crate::stats::PipelineStats;
use crate::types::SharedSnapshot;

/// Bounded FIFO of snapshots waiting for the decode context.
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct SnapshotQueue {
  tx: Sender<SharedSnapshot>,
  rx: Receiver<SharedSnapshot>,
  /// Set while a drain task owns this queue.
  draining: Arc<AtomicBool>,
  /// Set once the subscription feeding this queue is gone.
  closed: Arc<AtomicBool>,
}

impl SnapshotQueue {
  /// Queue holding at most `capacity` snapshots (at least one).
  pub fn new(capacity: usize) -> Self {
    let (tx, rx) = channel::bounded(capacity.max(1));
    Self {
      tx,
      rx,
      draining: Arc::new(AtomicBool::new(false)),
      closed: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn capacity(&self) -> usize {
    self.tx.capacity().unwrap_or(1)
  }

  pub fn len(&self) -> usize {
    self.rx.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rx.is_empty()
  }

  /// Enqueue `snapshot`, evicting the oldest entries while full.
  ///
  /// Returns how many snapshots were evicted.
  pub fn push(&self, snapshot: SharedSnapshot) -> usize {
    let mut pending = snapshot;
    let mut evicted = 0;
    loop {
      match self.tx.try_send(pending) {
        Ok(()) => return evicted,
        Err(TrySendError::Full(back)) => {
          pending = back;
          // A consumer may have emptied a slot in between; just retry then.
          if self.rx.try_recv().is_ok() {
            evicted += 1;
          }
        }
        // Unreachable while we hold the receiver.
        Err(TrySendError::Disconnected(_)) => return evicted,
      }
    }
  }

  /// Oldest queued snapshot.
  pub fn pop(&self) -> Option<SharedSnapshot> {
    self.rx.try_recv().ok()
  }

  /// Drop everything queued. Returns the number dropped.
  pub fn clear(&self) -> usize {
    self.rx.try_iter().count()
  }

  /// Refuse further snapshots and drop the queued ones. Returns the number
  /// dropped.
  pub fn close(&self) -> usize {
    self.closed.store(true, Ordering::Release);
    self.clear()
  }

  pub fn is_closed(&self) -> bool {
    self.closed.load(Ordering::Acquire)
  }

  /// Claim the drain slot. Returns false if a drain is already running.
  pub(crate) fn try_begin_drain(&self) -> bool {
    !self.draining.swap(true, Ordering::AcqRel)
  }

  pub(crate) fn end_drain(&self) {
    self.draining.store(false, Ordering::Release);
  }
}

/// Producer handle given to the transport for one subscription.
#[derive(Clone)]
pub struct SnapshotSender {
  queue: SnapshotQueue,
  worker: DecodeWorker,
  stats: Arc<PipelineStats>,
}

impl SnapshotSender {
  pub fn new(queue: SnapshotQueue, worker: DecodeWorker, stats: Arc<PipelineStats>) -> Self {
    Self {
      queue,
      worker,
      stats,
    }
  }

  /// Hand a snapshot to the decode context. Never blocks on decoding.
  pub fn deliver(&self, snapshot: impl Into<SharedSnapshot>) {
    if self.queue.is_closed() {
      return;
    }
    self.stats.record_received();
    let evicted = self.queue.push(snapshot.into());
    for _ in 0..evicted {
      self.stats.record_dropped_overflow();
    }
    if evicted > 0 {
      tracing::warn!(
        evicted,
        capacity = self.queue.capacity(),
        "inbound queue full, dropped oldest snapshot"
      );
    }
    self.worker.kick(&self.queue);
  }

  pub fn queue(&self) -> &SnapshotQueue {
    &self.queue
  }
}

#[cfg(test)]
#[path = "inbound_test.rs"]
mod inbound_test;
