//! Bevy presentation layer for octomap_cloud.
//!
//! This crate bridges the engine-independent octomap_cloud controller with
//! Bevy: one vertex-colored box mesh per octree depth, parented under a
//! root entity that turns octomap's Z-up frame into Bevy's Y-up world.

pub mod components;
pub mod mesh;
pub mod resources;
pub mod sink;
pub mod systems;

use std::sync::Arc;

use bevy::prelude::*;
pub use components::*;
pub use mesh::build_cloud_mesh;
use octomap_cloud::{CloudConfig, FrameTransformer, OctomapCloudController, SnapshotTransport};
pub use resources::*;
pub use sink::BevyCloudSink;

/// Bevy plugin for octomap point-cloud rendering.
///
/// The controller is enabled right away and lives in the [`OctomapCloud`]
/// resource.
pub struct OctomapCloudPlugin {
  pub config: CloudConfig,
  pub transport: Arc<dyn SnapshotTransport>,
  pub frames: Arc<dyn FrameTransformer>,
}

impl Plugin for OctomapCloudPlugin {
  fn build(&self, app: &mut App) {
    let mut controller = OctomapCloudController::new(
      self.config.clone(),
      Arc::clone(&self.transport),
      Arc::clone(&self.frames),
    );
    controller.on_enable();

    app
      .insert_resource(OctomapCloud(controller))
      .init_resource::<CloudEntities>()
      .add_systems(Startup, systems::setup_cloud_root)
      .add_systems(
        Update,
        (systems::tick_octomap_cloud, systems::log_status_changes).chain(),
      );
  }
}
