//! Test utilities for pipeline tests.
//!
//! Provides snapshot fixtures and a pipeline harness wired to in-process
//! collaborators.

use std::sync::{Arc, RwLock};

use glam::{DAffine3, DVec3};

use super::update::{DecodeSettings, SharedSettings, UpdatePipeline};
use crate::buckets::DisplayHandoff;
use crate::config::CloudConfig;
use crate::frames::StaticFrames;
use crate::octree::{OccupancyTree, OctreeKey};
use crate::stats::PipelineStats;
use crate::types::{OctreeSnapshot, SharedSnapshot};

// =============================================================================
// Snapshot fixtures
// =============================================================================

/// Voxels at depths {2, 2, 5} in a 6-level tree.
pub fn three_voxel_snapshot() -> SharedSnapshot {
  let mut tree = OccupancyTree::new(0.1, 6);
  tree.insert(OctreeKey::new(0, 0, 0, 2), true);
  tree.insert(OctreeKey::new(3, 3, 3, 2), true);
  tree.insert(OctreeKey::new(31, 0, 0, 5), true);
  Arc::new(tree.to_snapshot("map"))
}

/// `count` finest-level voxels stacked along +z (distinct heights).
pub fn column_snapshot(frame_id: &str, count: u32) -> SharedSnapshot {
  let mut tree = OccupancyTree::new(0.5, 8);
  for z in 0..count {
    tree.insert(OctreeKey::new(128, 128, 128 + z, 8), true);
  }
  Arc::new(tree.to_snapshot(frame_id))
}

/// Root says child 0 is inner, then the stream ends.
pub fn truncated_snapshot() -> SharedSnapshot {
  Arc::new(OctreeSnapshot::new("map", 0.1, vec![0b11, 0]))
}

// =============================================================================
// Pipeline harness
// =============================================================================

/// An `UpdatePipeline` plus handles to everything it shares.
pub struct Harness {
  pub pipeline: UpdatePipeline,
  pub handoff: Arc<DisplayHandoff>,
  pub settings: SharedSettings,
  pub stats: Arc<PipelineStats>,
  pub frames: Arc<StaticFrames>,
}

impl Harness {
  /// Fixed frame "map", plus "odom" one meter up.
  pub fn new(config: &CloudConfig) -> Self {
    let handoff = Arc::new(DisplayHandoff::new());
    let settings = Arc::new(RwLock::new(DecodeSettings::from(config)));
    let stats = Arc::new(PipelineStats::new());
    let frames = Arc::new(
      StaticFrames::new("map").with_pose("odom", DAffine3::from_translation(DVec3::Z)),
    );
    let pipeline = UpdatePipeline::new(
      Arc::clone(&handoff),
      frames.clone(),
      Arc::clone(&settings),
      Arc::clone(&stats),
    );
    Self {
      pipeline,
      handoff,
      settings,
      stats,
      frames,
    }
  }

  pub fn set_max_tree_depth(&self, depth: u8) {
    self.settings.write().expect("settings lock").max_tree_depth = depth;
  }
}

impl Default for Harness {
  fn default() -> Self {
    Self::new(&CloudConfig::default())
  }
}
