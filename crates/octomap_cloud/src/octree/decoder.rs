//! OctreeDecoder - walks a binary occupancy stream down to a maximum depth.
//!
//! ```text
//!            root (depth 0)
//!           /      \
//!        inner     leaf ●           ● occupied leaf -> voxel at its depth
//!        /   \                      ◆ inner node at max_depth -> one voxel
//!       ◆    ●                        iff its subtree holds any occupied leaf
//!     (max_depth)
//! ```
//!
//! The walk validates the whole payload before returning. Callers fill the
//! display buckets only from a successful result, so a malformed snapshot
//! never leaves partial points behind.

use smallvec::SmallVec;

use super::codec::{ChildKind, NodeReader};
use super::OctreeKey;
use crate::constants::MAX_WIRE_TREE_DEPTH;
use crate::error::DecodeError;
use crate::types::OctreeSnapshot;

/// Counters for one decode pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeStats {
  /// Inner nodes read from the stream.
  pub nodes: usize,
  /// Occupied leaves encountered (including those inside folded subtrees).
  pub occupied_leaves: usize,
  /// Voxels emitted.
  pub voxels: usize,
  /// Voxels emitted for inner nodes forced to be leaves at max depth.
  pub folded: usize,
}

/// Stateless walk with reusable traversal stacks.
#[derive(Default)]
pub struct OctreeDecoder {
  stack: Vec<OctreeKey>,
  skim: Vec<u8>,
}

impl OctreeDecoder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Collect every occupied voxel of `snapshot` no deeper than `max_depth`.
  ///
  /// `voxels` is cleared first. On error its contents are unspecified and
  /// must not be used.
  #[cfg_attr(
    feature = "profiling",
    tracing::instrument(skip_all, name = "octree::decode")
  )]
  pub fn decode(
    &mut self,
    snapshot: &OctreeSnapshot,
    max_depth: u8,
    voxels: &mut Vec<OctreeKey>,
  ) -> Result<DecodeStats, DecodeError> {
    validate_header(snapshot)?;
    voxels.clear();

    let mut stats = DecodeStats::default();
    if snapshot.data.is_empty() {
      return Ok(stats);
    }

    let tree_depth = snapshot.tree_depth;
    let mut reader = NodeReader::new(&snapshot.data);

    // Every key on the stack is an inner node whose bytes come next.
    self.stack.clear();
    self.stack.push(OctreeKey::ROOT);

    while let Some(node) = self.stack.pop() {
      if node.depth >= max_depth {
        if self.skim_subtree(&mut reader, node.depth, tree_depth, &mut stats)? {
          voxels.push(node);
          stats.voxels += 1;
          stats.folded += 1;
        }
        continue;
      }

      let children = reader.next_node()?;
      stats.nodes += 1;

      let mut inner: SmallVec<[OctreeKey; 8]> = SmallVec::new();
      for (octant, kind) in children.iter().enumerate() {
        let child = node.child(octant as u8);
        match kind {
          ChildKind::Occupied => {
            voxels.push(child);
            stats.occupied_leaves += 1;
            stats.voxels += 1;
          }
          ChildKind::Inner => {
            check_depth(child.depth, tree_depth)?;
            inner.push(child);
          }
          ChildKind::Free | ChildKind::Empty => {}
        }
      }
      // Reverse so octant 0's subtree is read first, matching stream order.
      self.stack.extend(inner.into_iter().rev());
    }

    reader.finish()?;
    Ok(stats)
  }

  /// Consume the subtree of an inner node, reporting whether any leaf in it
  /// is occupied.
  fn skim_subtree(
    &mut self,
    reader: &mut NodeReader<'_>,
    depth: u8,
    tree_depth: u8,
    stats: &mut DecodeStats,
  ) -> Result<bool, DecodeError> {
    let mut any_occupied = false;
    self.skim.clear();
    self.skim.push(depth);

    // Siblings share a depth, so LIFO order still labels each node correctly.
    while let Some(node_depth) = self.skim.pop() {
      let children = reader.next_node()?;
      stats.nodes += 1;
      for kind in children {
        match kind {
          ChildKind::Occupied => {
            any_occupied = true;
            stats.occupied_leaves += 1;
          }
          ChildKind::Inner => {
            check_depth(node_depth + 1, tree_depth)?;
            self.skim.push(node_depth + 1);
          }
          ChildKind::Free | ChildKind::Empty => {}
        }
      }
    }
    Ok(any_occupied)
  }
}

/// Reject headers the walk cannot interpret.
pub fn validate_header(snapshot: &OctreeSnapshot) -> Result<(), DecodeError> {
  if snapshot.tree_depth == 0 || snapshot.tree_depth > MAX_WIRE_TREE_DEPTH {
    return Err(DecodeError::UnsupportedTreeDepth(snapshot.tree_depth));
  }
  if !(snapshot.resolution.is_finite() && snapshot.resolution > 0.0) {
    return Err(DecodeError::InvalidResolution(snapshot.resolution));
  }
  Ok(())
}

/// Inner nodes cannot sit at or below the finest level.
#[inline]
fn check_depth(depth: u8, tree_depth: u8) -> Result<(), DecodeError> {
  if depth >= tree_depth {
    return Err(DecodeError::TooDeep { depth, tree_depth });
  }
  Ok(())
}

#[cfg(test)]
#[path = "decoder_test.rs"]
mod decoder_test;
