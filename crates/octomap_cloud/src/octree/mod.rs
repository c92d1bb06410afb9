//! Octree module - keys, binary wire codec and depth-capped decoding.
//!
//! The tree is never materialized on the decode path: the binary stream is
//! walked once and occupied voxels are emitted as [`OctreeKey`]s.
//!
//! # Depth Convention
//!
//! Depth 0 = root (coarsest), higher depth = finer.
//!
//! ```text
//! Voxel Edge = resolution * 2^(tree_depth - depth)
//! ```
//!
//! # Module Structure
//!
//! - [`key`]: `OctreeKey` - immutable value type for node positions
//! - [`codec`]: binary occupancy stream reader and `OccupancyTree` writer
//! - [`decoder`]: `OctreeDecoder` - max-depth walk emitting occupied voxels

pub mod codec;
pub mod decoder;
pub mod key;

// Re-exports
pub use codec::{ChildKind, NodeReader, OccupancyTree};
pub use decoder::{DecodeStats, OctreeDecoder};
pub use key::OctreeKey;
