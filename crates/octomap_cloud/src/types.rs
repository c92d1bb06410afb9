//! Core data types shared by the decode path and the render tick.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;

use crate::constants::OCTOMAP_TREE_DEPTH;

/// Linear RGBA color, components in [0, 1].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
  pub r: f32,
  pub g: f32,
  pub b: f32,
  pub a: f32,
}

impl Rgba {
  /// Opaque color from RGB components.
  #[inline]
  pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
    Self { r, g, b, a: 1.0 }
  }

  /// Components as `[r, g, b, a]` (vertex color layout).
  #[inline]
  pub fn to_array(self) -> [f32; 4] {
    [self.r, self.g, self.b, self.a]
  }
}

/// One renderable point: voxel center in the display frame plus its color.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColoredPoint {
  /// Voxel center in the fixed (display) frame.
  pub position: Vec3,
  /// Height-derived color.
  pub color: Rgba,
}

/// A serialized octree as delivered by the transport.
///
/// Immutable once received. Shared through the inbound queue as
/// [`SharedSnapshot`] and consumed by exactly one decode.
#[derive(Clone, Debug, PartialEq)]
pub struct OctreeSnapshot {
  /// Coordinate frame the octree was built in.
  pub frame_id: String,
  /// Acquisition time (transport clock).
  pub stamp: Duration,
  /// Edge length of the finest voxels, in meters.
  pub resolution: f64,
  /// Number of levels below the root.
  pub tree_depth: u8,
  /// Binary occupancy stream (see [`crate::octree::codec`]).
  pub data: Vec<u8>,
}

impl OctreeSnapshot {
  /// Snapshot with octomap's standard 16-level tree.
  pub fn new(frame_id: impl Into<String>, resolution: f64, data: Vec<u8>) -> Self {
    Self {
      frame_id: frame_id.into(),
      stamp: Duration::ZERO,
      resolution,
      tree_depth: OCTOMAP_TREE_DEPTH,
      data,
    }
  }

  pub fn with_stamp(mut self, stamp: Duration) -> Self {
    self.stamp = stamp;
    self
  }

  pub fn with_tree_depth(mut self, tree_depth: u8) -> Self {
    self.tree_depth = tree_depth;
    self
  }
}

/// Snapshot handle passed between transport, queue and decode context.
pub type SharedSnapshot = Arc<OctreeSnapshot>;

/// Vertical extent of one decode pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightRange {
  pub min: f64,
  pub max: f64,
}

impl HeightRange {
  /// Create range with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: f64::INFINITY,
      max: f64::NEG_INFINITY,
    }
  }

  /// Expand range to include a height.
  #[inline]
  pub fn encapsulate(&mut self, z: f64) {
    self.min = self.min.min(z);
    self.max = self.max.max(z);
  }

  /// Check if range is valid (min <= max).
  pub fn is_valid(&self) -> bool {
    self.min <= self.max
  }

  /// Range spanning all heights in `heights`.
  pub fn from_heights(heights: impl IntoIterator<Item = f64>) -> Self {
    let mut range = Self::empty();
    for z in heights {
      range.encapsulate(z);
    }
    range
  }
}

impl Default for HeightRange {
  fn default() -> Self {
    Self::empty()
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
