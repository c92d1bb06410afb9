//! Orbit camera around a focus point on the map.
//!
//! ```text
//!            camera
//!              ●
//!             /│  pitch
//!   distance / │
//!           /  │
//!  focus ──●───┘  yaw around +Y
//! ```
//!
//! Right-drag orbits, scroll zooms, WASD pans the focus across the ground
//! plane, Q / E lower and raise it.

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;

const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 200.0;
const PITCH_LIMIT: f32 = 1.54;

#[derive(Component, Debug, Clone)]
pub struct OrbitCamera {
  pub focus: Vec3,
  pub distance: f32,
  /// Radians around +Y.
  pub yaw: f32,
  /// Radians above the ground plane.
  pub pitch: f32,
  /// Radians per pixel of drag.
  pub sensitivity: f32,
  /// Zoom factor per scroll line.
  pub zoom_step: f32,
}

impl Default for OrbitCamera {
  fn default() -> Self {
    Self {
      focus: Vec3::ZERO,
      distance: 18.0,
      yaw: 0.0,
      pitch: 0.6,
      sensitivity: 0.005,
      zoom_step: 0.1,
    }
  }
}

impl OrbitCamera {
  /// Orbit around `focus` whose initial eye position is `eye`.
  pub fn from_eye(eye: Vec3, focus: Vec3) -> Self {
    let offset = eye - focus;
    let distance = offset.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
    Self {
      focus,
      distance,
      yaw: offset.x.atan2(offset.z),
      pitch: (offset.y / offset.length().max(f32::EPSILON))
        .asin()
        .clamp(-PITCH_LIMIT, PITCH_LIMIT),
      ..default()
    }
  }

  pub fn eye(&self) -> Vec3 {
    let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
    let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
    self.focus + self.distance * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
  }

  pub fn transform(&self) -> Transform {
    Transform::from_translation(self.eye()).looking_at(self.focus, Vec3::Y)
  }

  pub fn orbit(&mut self, drag: Vec2) {
    self.yaw -= drag.x * self.sensitivity;
    self.pitch = (self.pitch + drag.y * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
  }

  /// Positive `lines` zoom in.
  pub fn zoom(&mut self, lines: f32) {
    let scale = (1.0 - self.zoom_step).powf(lines);
    self.distance = (self.distance * scale).clamp(MIN_DISTANCE, MAX_DISTANCE);
  }

  /// Move the focus. `input.x` is screen-right, `input.y` screen-forward,
  /// `input.z` up. Pan speed grows with distance.
  pub fn pan(&mut self, input: Vec3, dt: f32) {
    let forward = Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos());
    let right = Vec3::new(-forward.z, 0.0, forward.x);
    let direction = right * input.x + forward * input.y + Vec3::Y * input.z;
    self.focus += direction.normalize_or_zero() * self.distance * 0.5 * dt;
  }
}

pub fn update_orbit_camera(
  time: Res<Time>,
  keys: Res<ButtonInput<KeyCode>>,
  mouse_button: Res<ButtonInput<MouseButton>>,
  mouse_motion: Res<AccumulatedMouseMotion>,
  mouse_scroll: Res<AccumulatedMouseScroll>,
  mut query: Query<(&mut OrbitCamera, &mut Transform)>,
) {
  let Ok((mut orbit, mut transform)) = query.single_mut() else {
    return;
  };

  if mouse_button.pressed(MouseButton::Right) {
    orbit.orbit(mouse_motion.delta);
  }
  if mouse_scroll.delta.y != 0.0 {
    orbit.zoom(mouse_scroll.delta.y);
  }

  let axis = |positive: KeyCode, negative: KeyCode| {
    keys.pressed(positive) as i32 as f32 - keys.pressed(negative) as i32 as f32
  };
  let input = Vec3::new(
    axis(KeyCode::KeyD, KeyCode::KeyA),
    axis(KeyCode::KeyW, KeyCode::KeyS),
    axis(KeyCode::KeyE, KeyCode::KeyQ),
  );
  if input != Vec3::ZERO {
    orbit.pan(input, time.delta_secs());
  }

  *transform = orbit.transform();
}
