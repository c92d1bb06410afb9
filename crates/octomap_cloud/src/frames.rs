//! Frame transforms - where a snapshot's frame sits in the fixed frame.
//!
//! [`FrameTransformer`] is the seam to whatever transform tree the host
//! application maintains. [`StaticFrames`] is a minimal in-process tree:
//! every named frame has a rigid pose relative to one common root.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::PoisonError;
use std::time::Duration;

use glam::DAffine3;

use crate::error::TransformError;

/// Resolves the pose of one frame in another.
pub trait FrameTransformer: Send + Sync {
  /// Transform taking points in `source` to points in `target` at `stamp`.
  fn lookup(&self, source: &str, target: &str, stamp: Duration)
    -> Result<DAffine3, TransformError>;
}

/// Named rigid poses relative to a root frame. Stamps are ignored.
pub struct StaticFrames {
  root: String,
  poses: RwLock<HashMap<String, DAffine3>>,
}

impl StaticFrames {
  /// Tree containing only `root`.
  pub fn new(root: impl Into<String>) -> Self {
    Self {
      root: root.into(),
      poses: RwLock::new(HashMap::new()),
    }
  }

  pub fn root(&self) -> &str {
    &self.root
  }

  /// Place `frame` at `pose` (frame -> root). Replaces any earlier pose.
  pub fn set_pose(&self, frame: impl Into<String>, pose: DAffine3) {
    let frame = frame.into();
    if frame == self.root {
      tracing::warn!(frame = %frame, "root frame pose is fixed to identity");
      return;
    }
    self
      .poses
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(frame, pose);
  }

  /// Builder form of [`set_pose`](Self::set_pose).
  pub fn with_pose(self, frame: impl Into<String>, pose: DAffine3) -> Self {
    self.set_pose(frame, pose);
    self
  }

  pub fn remove(&self, frame: &str) {
    self
      .poses
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(frame);
  }

  fn pose_of(&self, frame: &str, poses: &HashMap<String, DAffine3>) -> Option<DAffine3> {
    if frame == self.root {
      return Some(DAffine3::IDENTITY);
    }
    poses.get(frame).copied()
  }
}

impl FrameTransformer for StaticFrames {
  fn lookup(
    &self,
    source: &str,
    target: &str,
    _stamp: Duration,
  ) -> Result<DAffine3, TransformError> {
    if source == target {
      return Ok(DAffine3::IDENTITY);
    }
    let poses = self.poses.read().unwrap_or_else(PoisonError::into_inner);
    let unknown = |frame: &str| TransformError {
      source_frame: source.to_string(),
      target_frame: target.to_string(),
      reason: format!("frame '{frame}' does not exist"),
    };
    let source_pose = self.pose_of(source, &poses).ok_or_else(|| unknown(source))?;
    let target_pose = self.pose_of(target, &poses).ok_or_else(|| unknown(target))?;
    Ok(target_pose.inverse() * source_pose)
  }
}
