//! Viewer configuration (TOML).
//!
//! ```toml
//! [display]
//! topic = "octomap_binary"
//! max_tree_depth = 12
//!
//! [scene]
//! resolution = 0.1
//! publish_interval = 0.5
//! ```
//!
//! Every key is optional.

use anyhow::{Context, Result};
use octomap_cloud::CloudConfig;
use serde::Deserialize;
use std::path::Path;

/// Root configuration for the viewer.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
  /// Display settings handed to the controller.
  pub display: CloudConfig,
  /// Synthetic map publisher.
  pub scene: SceneConfig,
}

/// Synthetic terrain published on the local bus.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
  /// Frame the published maps are expressed in.
  pub frame_id: String,
  /// Finest voxel edge length in meters.
  pub resolution: f64,
  /// Side length of the square terrain patch in meters.
  pub extent: f64,
  /// Seconds between published maps.
  pub publish_interval: f32,
  /// Octree depth of the published maps (1..=16).
  pub tree_depth: u8,
}

impl Default for SceneConfig {
  fn default() -> Self {
    Self {
      frame_id: "map".to_string(),
      resolution: 0.1,
      extent: 16.0,
      publish_interval: 1.0,
      tree_depth: 16,
    }
  }
}

impl ViewerConfig {
  pub fn load(path: &Path) -> Result<Self> {
    let text = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config: {}", path.display()))?;
    Self::parse(&text).with_context(|| format!("Failed to parse config: {}", path.display()))
  }

  pub fn parse(text: &str) -> Result<Self> {
    Ok(toml::from_str(text)?)
  }
}
