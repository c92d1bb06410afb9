//! OctreeKey - immutable value type identifying an octree node.
//!
//! Nodes are identified by their grid coordinates at their own depth.
//! Depth 0 = root (single cell), each level doubles the grid per axis.

use glam::DVec3;

use crate::constants::edge_length_at;

/// Octree node key - immutable value type.
///
/// Grid coordinates are at the node's own depth, not the finest level, so a
/// node at depth `d` has coordinates in `0..2^d` per axis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OctreeKey {
  /// Grid X position at this node's depth
  pub x: u32,
  /// Grid Y position at this node's depth
  pub y: u32,
  /// Grid Z position at this node's depth
  pub z: u32,
  /// Depth below the root (0 = root)
  pub depth: u8,
}

impl OctreeKey {
  /// The root node.
  pub const ROOT: Self = Self {
    x: 0,
    y: 0,
    z: 0,
    depth: 0,
  };

  /// Create a new key at the given position and depth.
  pub fn new(x: u32, y: u32, z: u32, depth: u8) -> Self {
    Self { x, y, z, depth }
  }

  /// Get child key (one level finer).
  ///
  /// Octant: 0-7 where bits represent +X, +Y, +Z offsets:
  /// - bit 0: X offset (0 or 1)
  /// - bit 1: Y offset (0 or 1)
  /// - bit 2: Z offset (0 or 1)
  #[inline]
  pub fn child(&self, octant: u8) -> Self {
    Self {
      x: self.x * 2 + (octant & 1) as u32,
      y: self.y * 2 + ((octant >> 1) & 1) as u32,
      z: self.z * 2 + ((octant >> 2) & 1) as u32,
      depth: self.depth + 1,
    }
  }

  /// Get parent key (one level coarser).
  ///
  /// Returns None at the root.
  pub fn parent(&self) -> Option<Self> {
    if self.depth == 0 {
      return None;
    }
    Some(Self {
      x: self.x / 2,
      y: self.y / 2,
      z: self.z / 2,
      depth: self.depth - 1,
    })
  }

  /// Octant of this node within its parent.
  #[inline]
  pub fn octant(&self) -> u8 {
    ((self.x & 1) | ((self.y & 1) << 1) | ((self.z & 1) << 2)) as u8
  }

  /// Ancestor at `depth` (self if already at or above it).
  pub fn ancestor_at(&self, depth: u8) -> Self {
    if depth >= self.depth {
      return *self;
    }
    let shift = self.depth - depth;
    Self {
      x: self.x >> shift,
      y: self.y >> shift,
      z: self.z >> shift,
      depth,
    }
  }

  /// Center of this node in the octree's own frame.
  ///
  /// The root is centered on the origin, so the tree spans
  /// `±2^(tree_depth-1) * resolution` per axis.
  #[inline]
  pub fn center(&self, resolution: f64, tree_depth: u8) -> DVec3 {
    let size = edge_length_at(resolution, tree_depth, self.depth);
    let half_extent = edge_length_at(resolution, tree_depth, 0) * 0.5;
    DVec3::new(
      (self.x as f64 + 0.5) * size - half_extent,
      (self.y as f64 + 0.5) * size - half_extent,
      (self.z as f64 + 0.5) * size - half_extent,
    )
  }

  /// Key of the finest-level cell containing `point`, or None outside the tree.
  pub fn from_point(point: DVec3, resolution: f64, tree_depth: u8) -> Option<Self> {
    let half_extent = edge_length_at(resolution, tree_depth, 0) * 0.5;
    let cells = 1u64 << tree_depth;
    let to_cell = |v: f64| -> Option<u32> {
      let cell = ((v + half_extent) / resolution).floor();
      (cell >= 0.0 && (cell as u64) < cells).then_some(cell as u32)
    };
    Some(Self {
      x: to_cell(point.x)?,
      y: to_cell(point.y)?,
      z: to_cell(point.z)?,
      depth: tree_depth,
    })
  }
}

#[cfg(test)]
#[path = "key_test.rs"]
mod key_test;
