//! PointCloudSink - callback interface for rendering bridges.
//!
//! This trait lets the controller push per-depth clouds to engine-specific
//! code (Bevy, a headless recorder) without depending on any engine. It is
//! only ever called from the render tick.

use crate::buckets::DepthBucket;
use crate::constants::MAX_DEPTH_LEVELS;
use crate::types::ColoredPoint;

/// Receiver of per-depth point clouds.
///
/// # Example (Bevy)
///
/// ```ignore
/// impl PointCloudSink for BevyCloudSink<'_, '_> {
///     fn update_cloud(&mut self, depth: u8, bucket: &DepthBucket) {
///         let mesh = build_cloud_mesh(bucket.points(), bucket.edge_length());
///         self.replace_mesh(depth, mesh);
///     }
///     fn clear_cloud(&mut self, depth: u8) {
///         self.despawn(depth);
///     }
/// }
/// ```
pub trait PointCloudSink {
  /// Replace the cloud at `depth` with `bucket`'s points, drawn as boxes of
  /// `bucket.edge_length()`.
  fn update_cloud(&mut self, depth: u8, bucket: &DepthBucket);

  /// Remove everything drawn at `depth`.
  fn clear_cloud(&mut self, depth: u8);
}

/// No-op implementation for headless operation.
pub struct NullSink;

impl PointCloudSink for NullSink {
  fn update_cloud(&mut self, _depth: u8, _bucket: &DepthBucket) {
    // No-op
  }

  fn clear_cloud(&mut self, _depth: u8) {
    // No-op
  }
}

/// One call received by a [`RecordingSink`].
#[derive(Clone, Debug, PartialEq)]
pub enum SinkCall {
  Update { depth: u8, points: usize },
  Clear { depth: u8 },
}

/// Keeps a copy of every cloud it is given, plus a call log.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
  clouds: [Option<(f32, Vec<ColoredPoint>)>; MAX_DEPTH_LEVELS],
  calls: Vec<SinkCall>,
}

impl RecordingSink {
  pub fn new() -> Self {
    Self::default()
  }

  /// Points currently shown at `depth`, if any.
  pub fn cloud(&self, depth: u8) -> Option<&[ColoredPoint]> {
    self
      .clouds
      .get(depth as usize)?
      .as_ref()
      .map(|(_, points)| points.as_slice())
  }

  /// Box size of the cloud at `depth`.
  pub fn edge_length(&self, depth: u8) -> Option<f32> {
    self.clouds.get(depth as usize)?.as_ref().map(|(edge, _)| *edge)
  }

  /// Depths with a visible cloud.
  pub fn live_depths(&self) -> Vec<u8> {
    (0..MAX_DEPTH_LEVELS as u8)
      .filter(|&d| self.clouds[d as usize].is_some())
      .collect()
  }

  pub fn total_points(&self) -> usize {
    self.clouds.iter().flatten().map(|(_, p)| p.len()).sum()
  }

  pub fn calls(&self) -> &[SinkCall] {
    &self.calls
  }

  /// Forget the call log, keeping the clouds.
  pub fn take_calls(&mut self) -> Vec<SinkCall> {
    std::mem::take(&mut self.calls)
  }
}

impl PointCloudSink for RecordingSink {
  fn update_cloud(&mut self, depth: u8, bucket: &DepthBucket) {
    if let Some(slot) = self.clouds.get_mut(depth as usize) {
      *slot = Some((bucket.edge_length(), bucket.points().to_vec()));
    }
    self.calls.push(SinkCall::Update {
      depth,
      points: bucket.len(),
    });
  }

  fn clear_cloud(&mut self, depth: u8) {
    if let Some(slot) = self.clouds.get_mut(depth as usize) {
      *slot = None;
    }
    self.calls.push(SinkCall::Clear { depth });
  }
}
