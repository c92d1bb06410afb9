use super::*;

#[test]
fn test_bucket_indices_fit_depth_cap() {
  assert_eq!(MAX_DEPTH_LEVELS, 16);
  assert_eq!(MAX_TREE_DEPTH as usize + 1, MAX_DEPTH_LEVELS);
  assert!(MAX_TREE_DEPTH < MAX_WIRE_TREE_DEPTH);
}

/// Finest depth has the base resolution as edge length.
#[test]
fn test_edge_length_at_finest_depth() {
  assert_eq!(edge_length_at(0.05, 16, 16), 0.05);
  assert_eq!(edge_length_at(0.1, 12, 12), 0.1);
}

/// Edge length doubles per level toward the root.
#[test]
fn test_edge_length_doubles_per_level() {
  let res = 0.25;
  assert_eq!(edge_length_at(res, 16, 15), 0.5);
  assert_eq!(edge_length_at(res, 16, 14), 1.0);
  assert_eq!(edge_length_at(res, 4, 0), 4.0);
}

/// Depth past the tree depth never shrinks below the base resolution.
#[test]
fn test_edge_length_saturates_below_finest() {
  assert_eq!(edge_length_at(0.1, 8, 12), 0.1);
}
