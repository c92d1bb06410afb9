//! UpdatePipeline - decode, colorize, bucket and commit one snapshot.
//!
//! ```text
//!  settings ─┐
//!            ▼
//!  snapshot ─► frame lookup ─► decode (scratch) ─► transform + height range
//!                  │                 │                        │
//!              Transform          Decode                      ▼
//!               error             error        begin_decode ─► colorize ─► push ─► commit
//!                  └──── dropped, staging untouched ────┘
//! ```
//!
//! Only the decode context touches an `UpdatePipeline`. Settings are read
//! once per snapshot, so a change made mid-decode applies to the next one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use glam::DVec3;
use web_time::Instant;

use super::inbound::SnapshotQueue;
use crate::buckets::{CommitOutcome, DepthBucketSet, DisplayHandoff};
use crate::colorize::colorize_in;
use crate::config::CloudConfig;
use crate::constants::edge_length_at;
use crate::error::PipelineError;
use crate::frames::FrameTransformer;
use crate::octree::{DecodeStats, OctreeDecoder, OctreeKey};
use crate::stats::PipelineStats;
use crate::types::{ColoredPoint, HeightRange, SharedSnapshot};

/// Per-snapshot view of the configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeSettings {
  pub max_tree_depth: u8,
  pub color_factor: f64,
  pub fixed_frame: String,
}

impl From<&CloudConfig> for DecodeSettings {
  fn from(config: &CloudConfig) -> Self {
    Self {
      max_tree_depth: config.max_tree_depth,
      color_factor: config.color_factor,
      fixed_frame: config.fixed_frame.clone(),
    }
  }
}

/// Settings written by the controller, read by the decode context.
pub type SharedSettings = Arc<RwLock<DecodeSettings>>;

/// Newest snapshot the decode context took on, kept for replay.
///
/// Popping from the queue and replaying into it both hold the slot lock, so
/// a replay never queues a snapshot older than the one being decoded.
#[derive(Default)]
pub struct LatestSnapshot(Mutex<LatestSlot>);

#[derive(Default)]
struct LatestSlot {
  /// Popped from an open queue; dropped again if it fails to decode.
  accepted: Option<SharedSnapshot>,
  /// Last one that reached the display.
  published: Option<SharedSnapshot>,
}

impl LatestSnapshot {
  fn slot(&self) -> MutexGuard<'_, LatestSlot> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Newest accepted snapshot, else the last published one.
  pub fn get(&self) -> Option<SharedSnapshot> {
    let slot = self.slot();
    slot.accepted.clone().or_else(|| slot.published.clone())
  }

  /// Pop the oldest snapshot from `queue` and remember it unless the queue
  /// is closed.
  pub fn accept_from(&self, queue: &SnapshotQueue) -> Option<SharedSnapshot> {
    let mut slot = self.slot();
    let snapshot = queue.pop()?;
    if !queue.is_closed() {
      slot.accepted = Some(Arc::clone(&snapshot));
    }
    Some(snapshot)
  }

  /// Queue [`get`](Self::get) again unless `queue` already holds newer
  /// snapshots. Returns whether anything was queued.
  pub fn replay_into(&self, queue: &SnapshotQueue) -> bool {
    let slot = self.slot();
    if !queue.is_empty() {
      return false;
    }
    match slot.accepted.as_ref().or(slot.published.as_ref()) {
      Some(snapshot) => {
        queue.push(Arc::clone(snapshot));
        true
      }
      None => false,
    }
  }

  pub fn set_published(&self, snapshot: &SharedSnapshot) {
    self.slot().published = Some(Arc::clone(snapshot));
  }

  /// `snapshot` failed; fall back to the last published one.
  pub fn reject(&self, snapshot: &SharedSnapshot) {
    let mut slot = self.slot();
    if slot
      .accepted
      .as_ref()
      .is_some_and(|accepted| Arc::ptr_eq(accepted, snapshot))
    {
      slot.accepted = None;
    }
  }

  pub fn clear(&self) {
    *self.slot() = LatestSlot::default();
  }
}

/// What happened to a snapshot that decoded cleanly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessOutcome {
  pub commit: CommitOutcome,
  pub decode: DecodeStats,
  pub height_range: HeightRange,
  pub elapsed_us: u64,
}

/// Decode-side state: scratch buffers, staging buckets and collaborators.
pub struct UpdatePipeline {
  decoder: OctreeDecoder,
  voxels: Vec<OctreeKey>,
  centers: Vec<DVec3>,
  buckets: DepthBucketSet,
  frames: Arc<dyn FrameTransformer>,
  settings: SharedSettings,
  stats: Arc<PipelineStats>,
  latest: Arc<LatestSnapshot>,
}

impl UpdatePipeline {
  pub fn new(
    handoff: Arc<DisplayHandoff>,
    frames: Arc<dyn FrameTransformer>,
    settings: SharedSettings,
    stats: Arc<PipelineStats>,
  ) -> Self {
    Self {
      decoder: OctreeDecoder::new(),
      voxels: Vec::new(),
      centers: Vec::new(),
      buckets: DepthBucketSet::new(handoff),
      frames,
      settings,
      stats,
      latest: Arc::new(LatestSnapshot::default()),
    }
  }

  /// Shared slot holding the newest accepted snapshot.
  pub fn latest(&self) -> &Arc<LatestSnapshot> {
    &self.latest
  }

  pub fn buckets(&self) -> &DepthBucketSet {
    &self.buckets
  }

  fn settings(&self) -> DecodeSettings {
    self
      .settings
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  /// Run one snapshot through the full update.
  ///
  /// Errors leave the staging generation and the display untouched.
  pub fn process(&mut self, snapshot: &SharedSnapshot) -> Result<ProcessOutcome, PipelineError> {
    let epoch = self.current_epoch();
    self.process_at(epoch, snapshot)
  }

  /// Display epoch a decode starting now belongs to.
  pub fn current_epoch(&self) -> u64 {
    self.buckets.handoff().epoch()
  }

  /// [`process`](Self::process) for a snapshot accepted under `epoch`. The
  /// commit is discarded if the display was invalidated since.
  #[cfg_attr(
    feature = "profiling",
    tracing::instrument(skip_all, name = "pipeline::process")
  )]
  pub fn process_at(
    &mut self,
    epoch: u64,
    snapshot: &SharedSnapshot,
  ) -> Result<ProcessOutcome, PipelineError> {
    let start = Instant::now();
    let settings = self.settings();

    let to_fixed = self
      .frames
      .lookup(&snapshot.frame_id, &settings.fixed_frame, snapshot.stamp)?;

    let decode = self
      .decoder
      .decode(snapshot, settings.max_tree_depth, &mut self.voxels)?;

    let (resolution, tree_depth) = (snapshot.resolution, snapshot.tree_depth);
    self.centers.clear();
    self.centers.extend(
      self
        .voxels
        .iter()
        .map(|key| to_fixed.transform_point3(key.center(resolution, tree_depth))),
    );
    let height_range = HeightRange::from_heights(self.centers.iter().map(|p| p.z));

    self
      .buckets
      .begin_decode_at(epoch, settings.max_tree_depth as usize + 1, |depth| {
        edge_length_at(resolution, tree_depth, depth) as f32
      });
    for (key, center) in self.voxels.iter().zip(&self.centers) {
      let point = ColoredPoint {
        position: center.as_vec3(),
        color: colorize_in(center.z, &height_range, settings.color_factor),
      };
      self.buckets.push(key.depth, point);
    }
    let commit = self.buckets.commit_decode();

    let elapsed_us = start.elapsed().as_micros() as u64;
    match commit {
      CommitOutcome::Published => {
        self.stats.record_decoded(elapsed_us);
        self.latest.set_published(snapshot);
      }
      CommitOutcome::Discarded => self.stats.record_discarded_stale(),
    }

    Ok(ProcessOutcome {
      commit,
      decode,
      height_range,
      elapsed_us,
    })
  }

  /// [`process`](Self::process) with failures absorbed into stats and logs.
  pub fn handle(&mut self, snapshot: &SharedSnapshot) -> Option<ProcessOutcome> {
    let epoch = self.current_epoch();
    self.handle_at(epoch, snapshot)
  }

  /// [`process_at`](Self::process_at) with failures absorbed.
  pub fn handle_at(&mut self, epoch: u64, snapshot: &SharedSnapshot) -> Option<ProcessOutcome> {
    match self.process_at(epoch, snapshot) {
      Ok(outcome) => {
        tracing::debug!(
          frame = %snapshot.frame_id,
          voxels = outcome.decode.voxels,
          folded = outcome.decode.folded,
          elapsed_us = outcome.elapsed_us,
          commit = ?outcome.commit,
          "octomap decoded"
        );
        Some(outcome)
      }
      Err(error) => {
        self.stats.record_failure(&error);
        self.latest.reject(snapshot);
        tracing::warn!(frame = %snapshot.frame_id, %error, "dropping octomap snapshot");
        None
      }
    }
  }
}

#[cfg(test)]
#[path = "update_test.rs"]
mod update_test;
