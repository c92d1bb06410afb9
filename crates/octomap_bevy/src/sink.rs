//! BevyCloudSink - PointCloudSink writing into the ECS.
//!
//! One child entity of the [`OctomapCloudRoot`](crate::OctomapCloudRoot) per
//! depth. Updating a depth swaps the entity's mesh; the old mesh asset is
//! freed once its handle drops.

use bevy::prelude::*;
use octomap_cloud::{DepthBucket, PointCloudSink};

use crate::components::CloudLayer;
use crate::mesh::build_cloud_mesh;
use crate::resources::CloudEntities;

pub struct BevyCloudSink<'a, 'w, 's> {
  pub commands: Commands<'w, 's>,
  pub meshes: &'a mut Assets<Mesh>,
  pub entities: &'a mut CloudEntities,
  pub material: Handle<StandardMaterial>,
  pub root: Entity,
}

impl PointCloudSink for BevyCloudSink<'_, '_, '_> {
  fn update_cloud(&mut self, depth: u8, bucket: &DepthBucket) {
    let mesh = self
      .meshes
      .add(build_cloud_mesh(bucket.points(), bucket.edge_length()));

    if let Some(entity) = self.entities.get(depth) {
      self.commands.entity(entity).insert(Mesh3d(mesh));
      return;
    }

    let entity = self
      .commands
      .spawn((
        Name::new(format!("Octomap depth {depth}")),
        Mesh3d(mesh),
        MeshMaterial3d(self.material.clone()),
        Transform::default(),
        CloudLayer { depth },
        ChildOf(self.root),
      ))
      .id();
    self.entities.insert(depth, entity);
  }

  fn clear_cloud(&mut self, depth: u8) {
    if let Some(entity) = self.entities.remove(depth) {
      self.commands.entity(entity).despawn();
    }
  }
}

#[cfg(test)]
#[path = "sink_test.rs"]
mod sink_test;
