//! Depth layout and default settings for octomap point-cloud display.
//!
//! # Depth Convention
//!
//! Depth 0 = root (coarsest, one node covering the whole map), higher depth =
//! finer. A standard octomap has 16 levels below the root.
//!
//! ```text
//! Edge Length = resolution * 2^(tree_depth - depth)
//!
//!   depth:      0    1    2   ...   14    15    16
//!   buckets:   [0]  [1]  [2]  ...  [14]  [15]   └─ folded into max_tree_depth
//! ```
//!
//! One point-cloud bucket exists per depth index `0..MAX_DEPTH_LEVELS`. Nodes
//! deeper than the configured `max_tree_depth` are aggregated into the bucket
//! at `max_tree_depth`.

/// Number of per-depth buckets (and renderable clouds).
pub const MAX_DEPTH_LEVELS: usize = 16;

/// Deepest depth index a bucket can hold.
pub const MAX_TREE_DEPTH: u8 = (MAX_DEPTH_LEVELS - 1) as u8;

/// Deepest tree the wire codec accepts (octomap's fixed 16 key bits).
pub const MAX_WIRE_TREE_DEPTH: u8 = 16;

/// Tree depth used by octomap publishers.
pub const OCTOMAP_TREE_DEPTH: u8 = 16;

/// Default topic octomap servers publish binary maps on.
pub const DEFAULT_TOPIC: &str = "octomap_binary";

/// Default inbound queue depth.
pub const DEFAULT_QUEUE_SIZE: usize = 5;

/// Default height-to-hue scaling.
pub const DEFAULT_COLOR_FACTOR: f64 = 0.8;

/// Valid range for the height-to-hue scaling.
pub const COLOR_FACTOR_RANGE: (f64, f64) = (0.0, 1.0);

/// Default fixed (display) frame.
pub const DEFAULT_FIXED_FRAME: &str = "map";

/// Number of decode timings kept for diagnostics.
pub const DECODE_TIMING_WINDOW: usize = 64;

/// Edge length of a voxel at `depth` in a tree of `tree_depth` levels.
///
/// `resolution` is the edge length of the finest voxels (depth == tree_depth).
#[inline]
pub fn edge_length_at(resolution: f64, tree_depth: u8, depth: u8) -> f64 {
  let levels_above_finest = tree_depth.saturating_sub(depth);
  resolution * (1u64 << levels_above_finest) as f64
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
