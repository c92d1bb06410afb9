use super::*;
use crate::buckets::DisplayUpdate;
use crate::config::CloudConfig;
use crate::pipeline::test_utils::*;
use crate::pipeline::worker::WorkerMode;

fn tagged(count: u32) -> SharedSnapshot {
  column_snapshot("map", count)
}

#[test]
fn test_capacity_is_at_least_one() {
  assert_eq!(SnapshotQueue::new(0).capacity(), 1);
  assert_eq!(SnapshotQueue::new(5).capacity(), 5);
}

#[test]
fn test_fifo_order() {
  let queue = SnapshotQueue::new(3);
  let (a, b) = (tagged(1), tagged(2));
  assert_eq!(queue.push(Arc::clone(&a)), 0);
  assert_eq!(queue.push(Arc::clone(&b)), 0);
  assert_eq!(queue.len(), 2);

  assert!(Arc::ptr_eq(&queue.pop().expect("first"), &a));
  assert!(Arc::ptr_eq(&queue.pop().expect("second"), &b));
  assert!(queue.pop().is_none());
}

/// A full queue drops its oldest entry and keeps the newcomer.
#[test]
fn test_full_queue_drops_oldest() {
  let queue = SnapshotQueue::new(2);
  let (a, b, c) = (tagged(1), tagged(2), tagged(3));
  queue.push(Arc::clone(&a));
  queue.push(Arc::clone(&b));
  assert_eq!(queue.push(Arc::clone(&c)), 1);

  assert_eq!(queue.len(), 2);
  assert!(Arc::ptr_eq(&queue.pop().expect("b"), &b));
  assert!(Arc::ptr_eq(&queue.pop().expect("c"), &c));
}

#[test]
fn test_clear_empties_queue() {
  let queue = SnapshotQueue::new(4);
  queue.push(tagged(1));
  queue.push(tagged(2));
  assert_eq!(queue.clear(), 2);
  assert!(queue.is_empty());
}

#[test]
fn test_closed_queue_is_emptied() {
  let queue = SnapshotQueue::new(4);
  queue.push(tagged(1));
  assert!(!queue.is_closed());
  assert_eq!(queue.close(), 1);
  assert!(queue.is_closed());
  assert!(queue.is_empty());
}

#[test]
fn test_deliver_to_closed_queue_is_ignored() {
  let harness = Harness::default();
  let stats = Arc::clone(&harness.stats);
  let worker = DecodeWorker::new(harness.pipeline, WorkerMode::Deferred);
  let sender = SnapshotSender::new(SnapshotQueue::new(2), worker, Arc::clone(&stats));

  sender.queue().close();
  sender.deliver(tagged(1));
  assert!(sender.queue().is_empty());
  assert_eq!(stats.messages_received(), 0);
}

#[test]
fn test_clones_share_queue() {
  let queue = SnapshotQueue::new(2);
  let clone = queue.clone();
  clone.push(tagged(1));
  assert_eq!(queue.len(), 1);
}

#[test]
fn test_drain_slot_is_exclusive() {
  let queue = SnapshotQueue::new(1);
  assert!(queue.try_begin_drain());
  assert!(!queue.clone().try_begin_drain());
  queue.end_drain();
  assert!(queue.try_begin_drain());
}

/// Queue size 1, two snapshots before the decode context runs: the older
/// one is dropped and the display reflects exactly the newer one.
#[test]
fn test_queue_size_one_keeps_newest() {
  let harness = Harness::new(&CloudConfig::default());
  let handoff = Arc::clone(&harness.handoff);
  let stats = Arc::clone(&harness.stats);
  let worker = DecodeWorker::new(harness.pipeline, WorkerMode::Deferred);
  let sender = SnapshotSender::new(SnapshotQueue::new(1), worker.clone(), Arc::clone(&stats));

  sender.deliver(tagged(2));
  sender.deliver(tagged(7));

  assert_eq!(worker.drain(sender.queue()), 1);
  let snapshot = stats.snapshot();
  assert_eq!(snapshot.messages_received, 2);
  assert_eq!(snapshot.dropped_overflow, 1);
  assert_eq!(snapshot.decoded, 1);

  match handoff.take_display_snapshot() {
    DisplayUpdate::Changed(generation) => assert_eq!(generation.point_count(), 7),
    DisplayUpdate::NoChange => panic!("expected a published generation"),
  }
}
