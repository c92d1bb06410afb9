//! CloudConfig - operator-facing configuration surface.
//!
//! Out-of-range values are clamped, never rejected. Every clamp logs a
//! warning so the operator can see why a value did not stick.

use serde::Deserialize;

use crate::constants::{
  COLOR_FACTOR_RANGE, DEFAULT_COLOR_FACTOR, DEFAULT_FIXED_FRAME, DEFAULT_QUEUE_SIZE,
  DEFAULT_TOPIC, MAX_TREE_DEPTH,
};

/// Display configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
  /// Topic octree snapshots are received on.
  pub topic: String,

  /// Inbound buffering depth (>= 1). Oldest snapshot is dropped when full.
  pub queue_size: usize,

  /// Deepest octree level rendered; deeper nodes are aggregated up.
  pub max_tree_depth: u8,

  /// Height-to-hue scaling.
  pub color_factor: f64,

  /// Frame the viewer is anchored to.
  pub fixed_frame: String,
}

impl Default for CloudConfig {
  fn default() -> Self {
    Self {
      topic: DEFAULT_TOPIC.to_string(),
      queue_size: DEFAULT_QUEUE_SIZE,
      max_tree_depth: MAX_TREE_DEPTH,
      color_factor: DEFAULT_COLOR_FACTOR,
      fixed_frame: DEFAULT_FIXED_FRAME.to_string(),
    }
  }
}

impl CloudConfig {
  pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
    self.topic = topic.into();
    self
  }

  pub fn with_queue_size(mut self, queue_size: usize) -> Self {
    self.queue_size = clamp_queue_size(queue_size);
    self
  }

  pub fn with_max_tree_depth(mut self, depth: u32) -> Self {
    self.max_tree_depth = clamp_max_tree_depth(depth);
    self
  }

  pub fn with_color_factor(mut self, factor: f64) -> Self {
    self.color_factor = clamp_color_factor(factor);
    self
  }

  pub fn with_fixed_frame(mut self, frame: impl Into<String>) -> Self {
    self.fixed_frame = frame.into();
    self
  }

  /// Copy with every field forced into its valid range.
  pub fn sanitized(self) -> Self {
    Self {
      queue_size: clamp_queue_size(self.queue_size),
      max_tree_depth: clamp_max_tree_depth(self.max_tree_depth as u32),
      color_factor: clamp_color_factor(self.color_factor),
      ..self
    }
  }

  /// Number of depth buckets a decode at this configuration fills.
  #[inline]
  pub fn active_depths(&self) -> usize {
    self.max_tree_depth as usize + 1
  }
}

/// Queue size is at least 1.
pub fn clamp_queue_size(queue_size: usize) -> usize {
  if queue_size == 0 {
    tracing::warn!("queue size 0 clamped to 1");
    return 1;
  }
  queue_size
}

/// Max tree depth is capped so bucket indices stay below 16.
pub fn clamp_max_tree_depth(depth: u32) -> u8 {
  if depth > MAX_TREE_DEPTH as u32 {
    tracing::warn!(depth, cap = MAX_TREE_DEPTH, "max tree depth clamped");
    return MAX_TREE_DEPTH;
  }
  depth as u8
}

/// Color factor is clamped into its range; NaN falls back to the default.
pub fn clamp_color_factor(factor: f64) -> f64 {
  let clamped = bounded_color_factor(factor);
  if clamped != factor {
    tracing::warn!(factor, clamped, "color factor clamped");
  }
  clamped
}

/// Silent variant of [`clamp_color_factor`] for per-point use.
#[inline]
pub fn bounded_color_factor(factor: f64) -> f64 {
  if factor.is_nan() {
    return DEFAULT_COLOR_FACTOR;
  }
  let (lo, hi) = COLOR_FACTOR_RANGE;
  factor.clamp(lo, hi)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
