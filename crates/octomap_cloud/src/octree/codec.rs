//! Binary occupancy stream - octomap's compact "binary" tree encoding.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ One inner node = 2 bytes, pre-order, depth first                        │
//! │                                                                         │
//! │   byte 0: children 0-3        byte 1: children 4-7                      │
//! │   ┌──┬──┬──┬──┬──┬──┬──┬──┐                                             │
//! │   │h3│l3│h2│l2│h1│l1│h0│l0│   child i -> bits 2*(i%4) (l), 2*(i%4)+1 (h)│
//! │   └──┴──┴──┴──┴──┴──┴──┴──┘                                             │
//! │                                                                         │
//! │   h l                                                                   │
//! │   0 0  no child (unknown space)                                         │
//! │   1 0  occupied leaf                                                    │
//! │   0 1  free leaf                                                        │
//! │   1 1  inner node: its subtree follows (children in order 0..7)         │
//! │                                                                         │
//! │ The stream starts with the root. Empty stream = empty tree.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only occupancy is encoded; inner nodes carry no value of their own.
//! [`OccupancyTree`] is the writing side: it stores classified leaves and
//! serializes them. It does no sensor fusion or probabilistic updates.

use glam::DVec3;

use super::OctreeKey;
use crate::error::DecodeError;
use crate::types::OctreeSnapshot;

/// Classification of one child slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildKind {
  /// No child (unknown space).
  Empty,
  /// Occupied leaf.
  Occupied,
  /// Free leaf.
  Free,
  /// Inner node with its own subtree.
  Inner,
}

impl ChildKind {
  /// Decode a 2-bit slot (bit 0 = low, bit 1 = high).
  #[inline]
  pub fn from_bits(bits: u8) -> Self {
    match bits & 0b11 {
      0b00 => ChildKind::Empty,
      0b10 => ChildKind::Occupied,
      0b01 => ChildKind::Free,
      _ => ChildKind::Inner,
    }
  }

  /// Encode into a 2-bit slot.
  #[inline]
  pub fn bits(self) -> u8 {
    match self {
      ChildKind::Empty => 0b00,
      ChildKind::Occupied => 0b10,
      ChildKind::Free => 0b01,
      ChildKind::Inner => 0b11,
    }
  }
}

/// Unpack the two bytes of an inner node.
pub fn read_children(bytes: [u8; 2]) -> [ChildKind; 8] {
  std::array::from_fn(|i| {
    let byte = bytes[i / 4];
    ChildKind::from_bits(byte >> (2 * (i % 4)))
  })
}

/// Pack eight child slots into the two bytes of an inner node.
pub fn write_children(children: &[ChildKind; 8]) -> [u8; 2] {
  let mut bytes = [0u8; 2];
  for (i, kind) in children.iter().enumerate() {
    bytes[i / 4] |= kind.bits() << (2 * (i % 4));
  }
  bytes
}

/// Sequential reader over a binary occupancy stream.
pub struct NodeReader<'a> {
  data: &'a [u8],
  pos: usize,
}

impl<'a> NodeReader<'a> {
  pub fn new(data: &'a [u8]) -> Self {
    Self { data, pos: 0 }
  }

  /// Read the child slots of the next inner node.
  pub fn next_node(&mut self) -> Result<[ChildKind; 8], DecodeError> {
    match self.data.get(self.pos..self.pos + 2) {
      Some(&[b0, b1]) => {
        self.pos += 2;
        Ok(read_children([b0, b1]))
      }
      _ => Err(DecodeError::Truncated {
        offset: self.pos,
        needed: self.pos + 2 - self.data.len(),
      }),
    }
  }

  /// Byte offset of the next node.
  pub fn position(&self) -> usize {
    self.pos
  }

  /// Fail if bytes remain after the last node.
  pub fn finish(self) -> Result<(), DecodeError> {
    let remaining = self.data.len() - self.pos;
    if remaining > 0 {
      return Err(DecodeError::TrailingBytes { remaining });
    }
    Ok(())
  }
}

// =============================================================================
// OccupancyTree - writing side
// =============================================================================

#[derive(Clone, Debug)]
struct Node {
  /// Leaf occupancy (ignored for inner nodes).
  occupied: bool,
  /// None for leaves.
  children: Option<Box<[Option<Node>; 8]>>,
}

impl Node {
  fn leaf(occupied: bool) -> Self {
    Self {
      occupied,
      children: None,
    }
  }

  fn inner() -> Self {
    Self {
      occupied: false,
      children: Some(Box::default()),
    }
  }

  /// Children of this node, splitting a leaf into eight copies of itself.
  fn expand(&mut self) -> &mut [Option<Node>; 8] {
    let occupied = self.occupied;
    self
      .children
      .get_or_insert_with(|| Box::new(std::array::from_fn(|_| Some(Node::leaf(occupied)))))
  }

  fn kind(&self) -> ChildKind {
    match (&self.children, self.occupied) {
      (Some(_), _) => ChildKind::Inner,
      (None, true) => ChildKind::Occupied,
      (None, false) => ChildKind::Free,
    }
  }

  /// Collapse children that are eight identical leaves.
  fn prune(&mut self) {
    let Some(children) = self.children.as_mut() else {
      return;
    };
    for child in children.iter_mut().flatten() {
      child.prune();
      let collapse = child.children.as_ref().and_then(|grandchildren| {
        let first = grandchildren[0].as_ref().map(Node::kind);
        let uniform = matches!(first, Some(ChildKind::Occupied | ChildKind::Free))
          && grandchildren
            .iter()
            .all(|g| g.as_ref().map(Node::kind) == first);
        uniform.then_some(first == Some(ChildKind::Occupied))
      });
      if let Some(occupied) = collapse {
        *child = Node::leaf(occupied);
      }
    }
  }

  fn write(&self, out: &mut Vec<u8>) {
    let Some(children) = self.children.as_ref() else {
      return;
    };
    let kinds: [ChildKind; 8] =
      std::array::from_fn(|i| children[i].as_ref().map_or(ChildKind::Empty, Node::kind));
    out.extend_from_slice(&write_children(&kinds));
    for child in children.iter().flatten() {
      if child.children.is_some() {
        child.write(out);
      }
    }
  }

  fn count_leaves(&self, occupied: bool) -> usize {
    match self.children.as_ref() {
      None => usize::from(self.occupied == occupied),
      Some(children) => children
        .iter()
        .flatten()
        .map(|c| c.count_leaves(occupied))
        .sum(),
    }
  }
}

/// Octree of classified leaves that serializes to the binary stream.
#[derive(Clone, Debug)]
pub struct OccupancyTree {
  resolution: f64,
  tree_depth: u8,
  root: Option<Node>,
}

impl OccupancyTree {
  /// Create an empty tree.
  pub fn new(resolution: f64, tree_depth: u8) -> Self {
    Self {
      resolution,
      tree_depth,
      root: None,
    }
  }

  pub fn resolution(&self) -> f64 {
    self.resolution
  }

  pub fn tree_depth(&self) -> u8 {
    self.tree_depth
  }

  /// Check if no leaf has been inserted.
  pub fn is_empty(&self) -> bool {
    self.root.is_none()
  }

  /// Classify the cell at `key`, replacing anything below it.
  ///
  /// Returns false (and changes nothing) for the root or keys deeper than
  /// the tree.
  pub fn insert(&mut self, key: OctreeKey, occupied: bool) -> bool {
    if key.depth == 0 || key.depth > self.tree_depth {
      return false;
    }
    let mut node = self.root.get_or_insert_with(Node::inner);
    for level in 1..=key.depth {
      let octant = key.ancestor_at(level).octant() as usize;
      let children = node.expand();
      if level == key.depth {
        children[octant] = Some(Node::leaf(occupied));
        return true;
      }
      node = children[octant].get_or_insert_with(Node::inner);
    }
    false
  }

  /// Classify the finest cell containing `point` (tree frame).
  pub fn insert_point(&mut self, point: DVec3, occupied: bool) -> bool {
    match OctreeKey::from_point(point, self.resolution, self.tree_depth) {
      Some(key) => self.insert(key, occupied),
      None => false,
    }
  }

  /// Merge sibling groups of identical leaves into their parent.
  pub fn prune(&mut self) {
    if let Some(root) = self.root.as_mut() {
      root.prune();
    }
  }

  /// Number of occupied leaves.
  pub fn occupied_leaf_count(&self) -> usize {
    self.root.as_ref().map_or(0, |r| r.count_leaves(true))
  }

  /// Number of free leaves.
  pub fn free_leaf_count(&self) -> usize {
    self.root.as_ref().map_or(0, |r| r.count_leaves(false))
  }

  /// Serialize to the binary occupancy stream.
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut out = Vec::new();
    if let Some(root) = self.root.as_ref() {
      root.write(&mut out);
    }
    out
  }

  /// Wrap the serialized tree in a snapshot stamped with `frame_id`.
  pub fn to_snapshot(&self, frame_id: impl Into<String>) -> OctreeSnapshot {
    OctreeSnapshot::new(frame_id, self.resolution, self.to_bytes()).with_tree_depth(self.tree_depth)
  }
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
