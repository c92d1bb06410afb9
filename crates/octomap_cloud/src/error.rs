//! Error types for the decode path and its external collaborators.
//!
//! None of these are fatal: the pipeline absorbs them at its boundary, logs
//! them and leaves the previous display generation visible.

use thiserror::Error;

/// Malformed octree payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
  #[error("tree depth {0} is outside the supported range 1..=16")]
  UnsupportedTreeDepth(u8),

  #[error("resolution {0} is not a positive finite length")]
  InvalidResolution(f64),

  #[error("payload truncated at byte {offset} (needed {needed} more)")]
  Truncated { offset: usize, needed: usize },

  #[error("{remaining} trailing bytes after the last node")]
  TrailingBytes { remaining: usize },

  #[error("inner node at depth {depth} in a tree of depth {tree_depth}")]
  TooDeep { depth: u8, tree_depth: u8 },
}

/// Frame stamp could not be resolved into the fixed frame.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no transform from '{source_frame}' to '{target_frame}': {reason}")]
pub struct TransformError {
  pub source_frame: String,
  pub target_frame: String,
  pub reason: String,
}

/// Subscription could not be established.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
  #[error("empty topic name")]
  EmptyTopic,

  #[error("transport rejected topic '{topic}': {reason}")]
  Rejected { topic: String, reason: String },
}

/// Why one snapshot did not reach the display.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
  #[error("transform failed: {0}")]
  Transform(#[from] TransformError),

  #[error("decode failed: {0}")]
  Decode(#[from] DecodeError),
}
