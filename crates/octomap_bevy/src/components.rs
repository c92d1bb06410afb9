//! Bevy components for octomap cloud rendering.

use bevy::prelude::*;

/// Parent of every cloud entity. Carries the Z-up to Y-up rotation.
///
/// # Example
/// ```ignore
/// commands.spawn((
///     Transform::from_rotation(z_up_to_y_up()),
///     Visibility::default(),
///     OctomapCloudRoot,
/// ));
/// ```
#[derive(Component, Default)]
pub struct OctomapCloudRoot;

/// Mesh entity drawing the cloud of one octree depth.
#[derive(Component)]
pub struct CloudLayer {
  pub depth: u8,
}

/// Rotation taking octomap's Z-up frame into Bevy's Y-up world.
pub fn z_up_to_y_up() -> Quat {
  Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_z_up_maps_to_y_up() {
    let rotation = z_up_to_y_up();
    assert!((rotation * Vec3::Z).abs_diff_eq(Vec3::Y, 1e-6));
    assert!((rotation * Vec3::X).abs_diff_eq(Vec3::X, 1e-6));
    assert!((rotation * Vec3::Y).abs_diff_eq(Vec3::NEG_Z, 1e-6));
  }
}
