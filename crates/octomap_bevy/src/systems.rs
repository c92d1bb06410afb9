//! Startup and per-frame systems.

use bevy::prelude::*;

use crate::components::{z_up_to_y_up, OctomapCloudRoot};
use crate::resources::{CloudEntities, CloudMaterial, OctomapCloud};
use crate::sink::BevyCloudSink;

/// Spawn the cloud root and the shared cloud material.
pub fn setup_cloud_root(
  mut commands: Commands,
  mut materials: ResMut<Assets<StandardMaterial>>,
) {
  let material = materials.add(StandardMaterial {
    base_color: Color::WHITE,
    unlit: true,
    ..default()
  });
  commands.insert_resource(CloudMaterial(material));
  commands.spawn((
    Name::new("Octomap"),
    Transform::from_rotation(z_up_to_y_up()),
    Visibility::default(),
    OctomapCloudRoot,
  ));
}

/// Hand newly decoded clouds to the ECS. Makes no changes when nothing new
/// was decoded.
#[cfg_attr(
  feature = "trace_tracy",
  tracing::instrument(skip_all, name = "octomap::tick")
)]
pub fn tick_octomap_cloud(
  commands: Commands,
  mut meshes: ResMut<Assets<Mesh>>,
  mut cloud: ResMut<OctomapCloud>,
  mut entities: ResMut<CloudEntities>,
  material: Option<Res<CloudMaterial>>,
  root: Query<Entity, With<OctomapCloudRoot>>,
) {
  let (Some(material), Ok(root)) = (material, root.single()) else {
    return;
  };
  let mut sink = BevyCloudSink {
    commands,
    meshes: &mut meshes,
    entities: &mut entities,
    material: material.0.clone(),
    root,
  };
  cloud.tick(&mut sink);
}

/// Log status entries whenever their level changes.
pub fn log_status_changes(
  cloud: Res<OctomapCloud>,
  mut last: Local<Option<octomap_cloud::StatusLevel>>,
) {
  let level = cloud.status().level();
  if *last == Some(level) {
    return;
  }
  *last = Some(level);
  for (name, entry) in cloud.status().iter() {
    info!("[Octomap] {name}: {} ({})", entry.message, entry.level);
  }
}
