//! Bevy resources for octomap cloud rendering.

use bevy::prelude::*;
use octomap_cloud::{OctomapCloudController, MAX_DEPTH_LEVELS};

/// The engine-independent controller, owned by the ECS.
///
/// Configuration setters and lifecycle calls go through `Deref`.
#[derive(Resource, Deref, DerefMut)]
pub struct OctomapCloud(pub OctomapCloudController);

/// Material shared by every cloud mesh (unlit, vertex colored).
#[derive(Resource, Clone)]
pub struct CloudMaterial(pub Handle<StandardMaterial>);

/// Cloud entity per depth.
#[derive(Resource, Default)]
pub struct CloudEntities {
  layers: [Option<Entity>; MAX_DEPTH_LEVELS],
}

impl CloudEntities {
  pub fn get(&self, depth: u8) -> Option<Entity> {
    self.layers.get(depth as usize).copied().flatten()
  }

  pub fn insert(&mut self, depth: u8, entity: Entity) -> Option<Entity> {
    self.layers.get_mut(depth as usize)?.replace(entity)
  }

  pub fn remove(&mut self, depth: u8) -> Option<Entity> {
    self.layers.get_mut(depth as usize)?.take()
  }

  /// Number of depths with a cloud entity.
  pub fn len(&self) -> usize {
    self.layers.iter().flatten().count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
