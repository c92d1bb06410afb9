//! DecodeWorker - the asynchronous decode context.
//!
//! Uses `rayon::spawn` as the threading solution:
//! - Native: rayon's thread pool (std::thread based)
//! - wasm32-unknown-unknown: wasm-bindgen-rayon (Web Workers)
//!
//! At most one drain task runs per queue, and every drain locks the shared
//! pipeline per snapshot, so decodes never interleave: snapshots are handled
//! one at a time in arrival order.
//!
//! Cancellation: the owner closes a queue before invalidating the display.
//! Snapshots popped from a closed queue are skipped, and a decode that read
//! its epoch before the invalidation is discarded at commit.
//!
//! Pops go through [`LatestSnapshot::accept_from`], so a settings replay
//! always re-queues the snapshot in flight rather than an older one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::inbound::SnapshotQueue;
use super::update::{LatestSnapshot, UpdatePipeline};

/// Where queued snapshots get decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkerMode {
  /// A rayon task drains the queue as soon as a snapshot arrives.
  #[default]
  Background,
  /// Snapshots wait until [`DecodeWorker::drain`] is called (tests, hosts
  /// with their own task system).
  Deferred,
}

/// Handle to the decode context. Clones share the pipeline.
#[derive(Clone)]
pub struct DecodeWorker {
  pipeline: Arc<Mutex<UpdatePipeline>>,
  latest: Arc<LatestSnapshot>,
  mode: WorkerMode,
}

impl DecodeWorker {
  pub fn new(pipeline: UpdatePipeline, mode: WorkerMode) -> Self {
    Self {
      latest: Arc::clone(pipeline.latest()),
      pipeline: Arc::new(Mutex::new(pipeline)),
      mode,
    }
  }

  pub fn mode(&self) -> WorkerMode {
    self.mode
  }

  /// Lock the pipeline. Blocks while a decode is running.
  pub fn lock_pipeline(&self) -> MutexGuard<'_, UpdatePipeline> {
    self.pipeline.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Start draining `queue` unless a drain already owns it.
  pub fn kick(&self, queue: &SnapshotQueue) {
    if self.mode == WorkerMode::Deferred || !queue.try_begin_drain() {
      return;
    }
    let worker = self.clone();
    let queue = queue.clone();
    rayon::spawn(move || {
      worker.drain_claimed(&queue);
    });
  }

  /// Decode everything queued on the calling thread. Returns the number of
  /// snapshots handled (including failed ones).
  ///
  /// Returns 0 without waiting if a background drain owns the queue.
  pub fn drain(&self, queue: &SnapshotQueue) -> usize {
    if !queue.try_begin_drain() {
      return 0;
    }
    self.drain_claimed(queue)
  }

  fn drain_claimed(&self, queue: &SnapshotQueue) -> usize {
    let mut handled = 0;
    loop {
      while let Some(snapshot) = self.latest.accept_from(queue) {
        let mut pipeline = self.lock_pipeline();
        // Epoch first: a close that lands after this read is followed by an
        // invalidation, which turns the commit stale.
        let epoch = pipeline.current_epoch();
        if queue.is_closed() {
          queue.clear();
          break;
        }
        pipeline.handle_at(epoch, &snapshot);
        handled += 1;
      }
      queue.end_drain();
      // A snapshot pushed after the last pop but before end_drain saw the
      // slot taken and did not spawn; pick it up here.
      if queue.is_empty() || !queue.try_begin_drain() {
        return handled;
      }
    }
  }
}

#[cfg(test)]
#[path = "worker_test.rs"]
mod worker_test;
