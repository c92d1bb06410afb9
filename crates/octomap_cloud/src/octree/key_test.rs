use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::*;

/// Equal keys must produce equal hashes (HashMap invariant).
#[test]
fn test_key_hash_consistency() {
  let key1 = OctreeKey::new(10, 20, 30, 6);
  let key2 = OctreeKey::new(10, 20, 30, 6);

  let hash = |key: &OctreeKey| {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
  };

  assert_eq!(key1, key2);
  assert_eq!(hash(&key1), hash(&key2), "Equal keys must have equal hashes");
  assert_ne!(key1, OctreeKey::new(10, 20, 30, 7));
}

/// All 8 octants produce children with the documented bit layout.
#[test]
fn test_child_all_8_octants() {
  let parent = OctreeKey::new(3, 4, 5, 4);

  for octant in 0u8..8 {
    let child = parent.child(octant);
    assert_eq!(child.x, parent.x * 2 + (octant & 1) as u32, "Octant {} X", octant);
    assert_eq!(child.y, parent.y * 2 + ((octant >> 1) & 1) as u32, "Octant {} Y", octant);
    assert_eq!(child.z, parent.z * 2 + ((octant >> 2) & 1) as u32, "Octant {} Z", octant);
    assert_eq!(child.depth, parent.depth + 1);
    assert_eq!(child.octant(), octant);
  }
}

#[test]
fn test_root_has_no_parent() {
  assert!(OctreeKey::ROOT.parent().is_none());
}

/// parent(child(key, octant)) == key for every octant.
#[test]
fn test_child_parent_roundtrip() {
  let original = OctreeKey::new(7, 8, 9, 5);
  for octant in 0u8..8 {
    let back = original.child(octant).parent();
    assert_eq!(back, Some(original), "Roundtrip failed for octant {}", octant);
  }
}

#[test]
fn test_ancestor_at_shifts_coordinates() {
  let key = OctreeKey::new(13, 6, 31, 5);
  assert_eq!(key.ancestor_at(3), OctreeKey::new(3, 1, 7, 3));
  assert_eq!(key.ancestor_at(0), OctreeKey::ROOT);
  assert_eq!(key.ancestor_at(9), key);
}

/// Root is centered on the origin.
#[test]
fn test_root_center_is_origin() {
  assert_eq!(OctreeKey::ROOT.center(0.1, 16), DVec3::ZERO);
}

/// Finest cells straddle the origin: key 2^(d-1) starts at 0.
#[test]
fn test_finest_center_matches_octomap_key_mapping() {
  let resolution = 0.5;
  let tree_depth = 4;
  // Cell index 8 of 16 spans [0, 0.5) -> center 0.25
  let key = OctreeKey::new(8, 7, 0, tree_depth);
  let center = key.center(resolution, tree_depth);
  assert_eq!(center, DVec3::new(0.25, -0.25, -3.75));
}

#[test]
fn test_coarse_center_is_mean_of_children() {
  let parent = OctreeKey::new(1, 2, 0, 3);
  let mean = (0u8..8)
    .map(|octant| parent.child(octant).center(0.2, 6))
    .fold(DVec3::ZERO, |acc, c| acc + c)
    / 8.0;
  assert!((mean - parent.center(0.2, 6)).length() < 1e-9);
}

#[test]
fn test_from_point_roundtrip() {
  let key = OctreeKey::new(5, 9, 14, 4);
  let center = key.center(1.0, 4);
  assert_eq!(OctreeKey::from_point(center, 1.0, 4), Some(key));
}

#[test]
fn test_from_point_outside_tree() {
  // Depth 2, resolution 1 spans [-2, 2) per axis.
  assert!(OctreeKey::from_point(DVec3::new(2.5, 0.0, 0.0), 1.0, 2).is_none());
  assert!(OctreeKey::from_point(DVec3::new(0.0, -2.5, 0.0), 1.0, 2).is_none());
  assert!(OctreeKey::from_point(DVec3::new(-2.0, 1.9, 0.0), 1.0, 2).is_some());
}
