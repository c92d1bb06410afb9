use super::*;
use crate::buckets::DisplayUpdate;
use crate::error::DecodeError;
use crate::pipeline::test_utils::*;
use crate::types::Rgba;

fn display(harness: &Harness) -> Arc<crate::buckets::BucketGeneration> {
  match harness.handoff.take_display_snapshot() {
    DisplayUpdate::Changed(generation) => generation,
    DisplayUpdate::NoChange => panic!("expected a published generation"),
  }
}

/// Depths {2, 2, 5} at max depth 4: bucket 2 holds two points, bucket 4
/// holds one, every other bucket is empty.
#[test]
fn test_three_voxel_scenario() {
  let mut harness = Harness::new(&CloudConfig::default().with_max_tree_depth(4));
  let outcome = harness
    .pipeline
    .process(&three_voxel_snapshot())
    .expect("valid snapshot");
  assert_eq!(outcome.commit, CommitOutcome::Published);

  let generation = display(&harness);
  assert_eq!(generation.active_depths(), 5);
  for (depth, bucket) in generation.buckets().iter().enumerate() {
    let expected = match depth {
      2 => 2,
      4 => 1,
      _ => 0,
    };
    assert_eq!(bucket.len(), expected, "depth {depth}");
  }
  // resolution 0.1, tree depth 6: edge = 0.1 * 2^(6 - depth)
  assert!((generation.bucket(2).edge_length() - 1.6).abs() < 1e-6);
  assert!((generation.bucket(4).edge_length() - 0.4).abs() < 1e-6);
}

#[test]
fn test_colors_span_height_range() {
  let mut harness = Harness::default();
  let outcome = harness
    .pipeline
    .process(&column_snapshot("map", 5))
    .expect("valid snapshot");
  assert!((outcome.height_range.max - outcome.height_range.min - 2.0).abs() < 1e-9);

  let generation = display(&harness);
  let bucket = generation.bucket(8);
  assert_eq!(bucket.len(), 5);
  let top = bucket
    .points()
    .iter()
    .max_by(|a, b| a.position.z.total_cmp(&b.position.z))
    .expect("points");
  assert_eq!(top.color, Rgba::rgb(1.0, 0.0, 0.0));
}

/// Centers land in the fixed frame.
#[test]
fn test_points_are_transformed_into_fixed_frame() {
  let mut harness = Harness::default();
  harness
    .pipeline
    .process(&column_snapshot("map", 1))
    .expect("valid snapshot");
  let in_map = display(&harness).bucket(8).points()[0].position;

  harness
    .pipeline
    .process(&column_snapshot("odom", 1))
    .expect("valid snapshot");
  let in_odom = display(&harness).bucket(8).points()[0].position;

  assert!((in_odom.z - in_map.z - 1.0).abs() < 1e-6);
  assert_eq!(in_odom.x, in_map.x);
}

/// A single voxel is a flat map and gets the midpoint color.
#[test]
fn test_single_voxel_uses_midpoint_color() {
  let mut harness = Harness::default();
  harness
    .pipeline
    .process(&column_snapshot("map", 1))
    .expect("valid snapshot");
  let point = display(&harness).bucket(8).points()[0];
  assert_eq!(point.color, crate::colorize::colorize(0.0, 0.0, 0.0, 0.8));
}

#[test]
fn test_malformed_snapshot_keeps_previous_display() {
  let mut harness = Harness::default();
  harness
    .pipeline
    .process(&column_snapshot("map", 3))
    .expect("valid snapshot");
  let before = display(&harness);

  let err = harness
    .pipeline
    .process(&truncated_snapshot())
    .expect_err("truncated");
  assert!(matches!(err, PipelineError::Decode(DecodeError::Truncated { .. })));

  assert!(!harness.handoff.take_display_snapshot().is_changed());
  assert_eq!(harness.handoff.display(), before);
  assert_eq!(harness.pipeline.buckets().staging().point_count(), 0);
}

#[test]
fn test_unknown_frame_drops_snapshot() {
  let mut harness = Harness::default();
  let err = harness
    .pipeline
    .process(&column_snapshot("camera", 2))
    .expect_err("unknown frame");
  assert!(matches!(err, PipelineError::Transform(_)));
  assert!(!harness.handoff.take_display_snapshot().is_changed());
}

#[test]
fn test_handle_records_failures() {
  let mut harness = Harness::default();
  assert!(harness.pipeline.handle(&truncated_snapshot()).is_none());
  assert!(harness.pipeline.handle(&column_snapshot("camera", 1)).is_none());
  assert!(harness.pipeline.handle(&column_snapshot("map", 1)).is_some());

  let stats = harness.stats.snapshot();
  assert_eq!(stats.decode_errors, 1);
  assert_eq!(stats.transform_errors, 1);
  assert_eq!(stats.decoded, 1);
  assert_eq!(stats.last_error, None);
}

#[test]
fn test_settings_read_per_snapshot() {
  let mut harness = Harness::default();
  harness
    .pipeline
    .process(&three_voxel_snapshot())
    .expect("valid snapshot");
  assert_eq!(display(&harness).bucket(5).len(), 1);

  harness.set_max_tree_depth(2);
  harness
    .pipeline
    .process(&three_voxel_snapshot())
    .expect("valid snapshot");
  let generation = display(&harness);
  assert_eq!(generation.active_depths(), 3);
  // The depth-5 voxel folds into its depth-2 ancestor, next to (0,0,0,2).
  assert_eq!(generation.bucket(2).len(), 3);
  assert!(generation.bucket(5).is_empty());
}

/// A decode begun after an invalidation belongs to the new epoch.
#[test]
fn test_decode_after_invalidate_is_published() {
  let mut harness = Harness::default();
  harness.handoff.invalidate();
  let outcome = harness
    .pipeline
    .process(&column_snapshot("map", 1))
    .expect("valid snapshot");
  assert_eq!(outcome.commit, CommitOutcome::Published);
  assert!(harness.handoff.take_display_snapshot().is_changed());
}

#[test]
fn test_stale_epoch_commit_is_discarded() {
  let mut harness = Harness::default();
  let epoch = harness.pipeline.current_epoch();
  harness.handoff.invalidate();

  let outcome = harness
    .pipeline
    .process_at(epoch, &column_snapshot("map", 3))
    .expect("valid snapshot");
  assert_eq!(outcome.commit, CommitOutcome::Discarded);
  assert!(!harness.handoff.take_display_snapshot().is_changed());
  assert!(harness.pipeline.latest().get().is_none());
  assert_eq!(harness.stats.snapshot().discarded_stale, 1);
}

#[test]
fn test_latest_tracks_published_snapshot() {
  let mut harness = Harness::default();
  assert!(harness.pipeline.latest().get().is_none());

  let snapshot = column_snapshot("map", 2);
  harness.pipeline.process(&snapshot).expect("valid snapshot");
  let latest = harness.pipeline.latest().get().expect("latest");
  assert!(Arc::ptr_eq(&latest, &snapshot));

  // Failures do not replace it.
  let _ = harness.pipeline.process(&truncated_snapshot());
  let latest = harness.pipeline.latest().get().expect("latest");
  assert!(Arc::ptr_eq(&latest, &snapshot));
}

#[test]
fn test_latest_follows_accepted_snapshot() {
  let latest = LatestSnapshot::default();
  let queue = SnapshotQueue::new(4);
  let older = column_snapshot("map", 2);
  let newer = column_snapshot("map", 5);
  latest.set_published(&older);
  queue.push(Arc::clone(&newer));

  let popped = latest.accept_from(&queue).expect("queued");
  assert!(Arc::ptr_eq(&popped, &newer));
  // Not published yet, but a replay must not go back to the older map.
  assert!(latest.replay_into(&queue));
  let replayed = queue.pop().expect("replayed");
  assert!(Arc::ptr_eq(&replayed, &newer));
}

#[test]
fn test_replay_skips_non_empty_queue() {
  let latest = LatestSnapshot::default();
  let queue = SnapshotQueue::new(4);
  assert!(!latest.replay_into(&queue));

  latest.set_published(&column_snapshot("map", 2));
  queue.push(column_snapshot("map", 3));
  assert!(!latest.replay_into(&queue));
  assert_eq!(queue.len(), 1);
}

#[test]
fn test_rejected_snapshot_falls_back_to_published() {
  let latest = LatestSnapshot::default();
  let queue = SnapshotQueue::new(4);
  let good = column_snapshot("map", 2);
  let bad = truncated_snapshot();
  latest.set_published(&good);
  queue.push(Arc::clone(&bad));

  latest.accept_from(&queue);
  latest.reject(&bad);
  let current = latest.get().expect("published");
  assert!(Arc::ptr_eq(&current, &good));
}

#[test]
fn test_closed_queue_is_not_accepted() {
  let latest = LatestSnapshot::default();
  let queue = SnapshotQueue::new(4);
  queue.push(column_snapshot("map", 2));
  // Closing normally drops the queue; push behind it to model a racing pop.
  queue.close();
  queue.push(column_snapshot("map", 3));

  assert!(latest.accept_from(&queue).is_some());
  assert!(latest.get().is_none());
}

#[test]
fn test_failed_decode_in_drain_keeps_published_for_replay() {
  let mut harness = Harness::default();
  let good = column_snapshot("map", 2);
  harness.pipeline.process(&good).expect("valid snapshot");

  let queue = SnapshotQueue::new(4);
  queue.push(truncated_snapshot());
  let bad = harness.pipeline.latest().accept_from(&queue).expect("queued");
  assert!(harness.pipeline.handle(&bad).is_none());
  let current = harness.pipeline.latest().get().expect("published");
  assert!(Arc::ptr_eq(&current, &good));
}
