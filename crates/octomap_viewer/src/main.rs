//! octomap_viewer - Bevy-based octomap point-cloud viewer
//!
//! Publishes a synthetic terrain map on an in-process bus and displays it
//! through the octomap cloud plugin.
//!
//! Controls:
//! - Right-drag: orbit, scroll: zoom, WASD / Q / E: pan
//! - Up / Down: Max tree depth
//! - C: Cycle color factor
//! - F: Toggle fixed frame (map / odom)
//! - R: Reset display

mod config;
mod orbit_camera;
mod panel;
mod scene;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::math::{DAffine3, DVec3};
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use clap::Parser;
use octomap_bevy::{OctomapCloud, OctomapCloudPlugin};
use octomap_cloud::{CloudConfig, LocalBus, StaticFrames};

use config::ViewerConfig;
use orbit_camera::{update_orbit_camera, OrbitCamera};
use panel::{OctomapPanelPlugin, FIXED_FRAMES};
use scene::SyntheticMapPlugin;

/// Color factors cycled with C.
const COLOR_FACTORS: [f64; 4] = [0.8, 0.5, 0.3, 1.0];

/// Octomap point-cloud viewer.
#[derive(Parser, Debug)]
#[command(name = "octomap_viewer")]
#[command(about = "Displays octomap snapshots as per-depth point clouds")]
struct Args {
  /// Path to a configuration TOML file.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Topic to subscribe to (overrides the config file).
  #[arg(short, long)]
  topic: Option<String>,

  /// Deepest octree level drawn, 0..=15.
  #[arg(long)]
  max_depth: Option<u32>,

  /// Height-to-hue scaling, 0..=1.
  #[arg(long)]
  color_factor: Option<f64>,
}

impl Args {
  /// Apply command-line overrides on top of the file configuration.
  fn apply(&self, mut display: CloudConfig) -> CloudConfig {
    if let Some(topic) = &self.topic {
      display = display.with_topic(topic.clone());
    }
    if let Some(depth) = self.max_depth {
      display = display.with_max_tree_depth(depth);
    }
    if let Some(factor) = self.color_factor {
      display = display.with_color_factor(factor);
    }
    display
  }
}

fn main() -> Result<()> {
  let args = Args::parse();

  let config = match &args.config {
    Some(path) => ViewerConfig::load(path)?,
    None => ViewerConfig::default(),
  };
  let display = args.apply(config.display);

  let bus = Arc::new(LocalBus::new());
  let frames = Arc::new(
    StaticFrames::new("map")
      .with_pose("odom", DAffine3::from_translation(DVec3::new(2.0, -1.0, 0.0))),
  );

  App::new()
    .add_plugins(DefaultPlugins.set(WindowPlugin {
      primary_window: Some(Window {
        title: "Octomap Viewer".into(),
        resolution: (1600, 900).into(),
        ..default()
      }),
      ..default()
    }))
    .add_plugins(FrameTimeDiagnosticsPlugin::default())
    .add_plugins(EguiPlugin::default())
    .add_plugins(OctomapCloudPlugin {
      config: display.clone(),
      transport: bus.clone(),
      frames,
    })
    .add_plugins(SyntheticMapPlugin {
      bus,
      topic: display.topic.clone(),
      config: config.scene,
    })
    .add_plugins(OctomapPanelPlugin)
    .add_systems(Startup, setup_viewer)
    .add_systems(Update, (update_orbit_camera, keyboard_shortcuts))
    .run();

  Ok(())
}

fn setup_viewer(mut commands: Commands) {
  commands.insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.15)));
  let orbit = OrbitCamera::from_eye(Vec3::new(-10.0, 8.0, 10.0), Vec3::ZERO);
  commands.spawn((Camera3d::default(), orbit.transform(), orbit));
  info!("[Viewer] Up/Down: max depth, C: color factor, F: fixed frame, R: reset");
}

fn keyboard_shortcuts(keys: Res<ButtonInput<KeyCode>>, mut cloud: ResMut<OctomapCloud>) {
  let depth = cloud.config().max_tree_depth as u32;
  if keys.just_pressed(KeyCode::ArrowUp) {
    cloud.set_max_tree_depth(depth + 1);
  }
  if keys.just_pressed(KeyCode::ArrowDown) {
    cloud.set_max_tree_depth(depth.saturating_sub(1));
  }

  if keys.just_pressed(KeyCode::KeyC) {
    let current = cloud.config().color_factor;
    let next = COLOR_FACTORS
      .iter()
      .position(|&f| f == current)
      .map_or(0, |i| (i + 1) % COLOR_FACTORS.len());
    cloud.set_color_factor(COLOR_FACTORS[next]);
  }

  if keys.just_pressed(KeyCode::KeyF) {
    let next = if cloud.config().fixed_frame == FIXED_FRAMES[0] {
      FIXED_FRAMES[1]
    } else {
      FIXED_FRAMES[0]
    };
    cloud.fixed_frame_changed(next);
  }

  if keys.just_pressed(KeyCode::KeyR) {
    cloud.reset();
  }
}
