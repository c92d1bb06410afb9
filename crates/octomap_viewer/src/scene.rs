//! Synthetic map publisher.
//!
//! Stands in for a mapping node: every `publish_interval` seconds a rolling
//! terrain patch is rebuilt as an occupancy tree and published on the local
//! bus. The terrain drifts between publishes so the display keeps changing.
//!
//! Building and publishing run on rayon's pool; the Bevy system only starts
//! a build when none is in flight.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bevy::math::DVec3;
use bevy::prelude::*;
use octomap_cloud::{LocalBus, OccupancyTree};

use crate::config::SceneConfig;

/// Layers of occupied voxels below the surface.
const SURFACE_THICKNESS: u32 = 2;

/// Plugin publishing synthetic maps on `bus`.
pub struct SyntheticMapPlugin {
  pub bus: Arc<LocalBus>,
  pub topic: String,
  pub config: SceneConfig,
}

impl Plugin for SyntheticMapPlugin {
  fn build(&self, app: &mut App) {
    app
      .insert_resource(MapPublisher {
        bus: Arc::clone(&self.bus),
        topic: self.topic.clone(),
        config: self.config.clone(),
        timer: Timer::from_seconds(self.config.publish_interval.max(0.01), TimerMode::Repeating),
        phase: 0.0,
        started: false,
        building: Arc::new(AtomicBool::new(false)),
        published: Arc::new(AtomicU64::new(0)),
      })
      .add_systems(Update, publish_synthetic_map);
  }
}

/// Publisher state.
#[derive(Resource)]
pub struct MapPublisher {
  pub bus: Arc<LocalBus>,
  pub topic: String,
  pub config: SceneConfig,
  timer: Timer,
  phase: f64,
  started: bool,
  /// Set while a build task runs.
  building: Arc<AtomicBool>,
  published: Arc<AtomicU64>,
}

impl MapPublisher {
  /// Maps published so far.
  pub fn published(&self) -> u64 {
    self.published.load(Ordering::Relaxed)
  }

  /// Build and publish the map for the current phase on rayon's pool.
  /// Returns false if the previous build is still running.
  fn spawn_publish(&mut self) -> bool {
    if self.building.swap(true, Ordering::AcqRel) {
      return false;
    }
    let bus = Arc::clone(&self.bus);
    let topic = self.topic.clone();
    let config = self.config.clone();
    let building = Arc::clone(&self.building);
    let published = Arc::clone(&self.published);
    let phase = self.phase;
    self.phase += 0.35;

    rayon::spawn(move || {
      let tree = build_terrain(&config, phase);
      let snapshot = tree.to_snapshot(config.frame_id.clone());
      let bytes = snapshot.data.len();
      let subscribers = bus.publish(&topic, snapshot);
      let count = published.fetch_add(1, Ordering::Relaxed) + 1;
      building.store(false, Ordering::Release);
      debug!(
        "[SyntheticMap] published #{} ({} bytes, {} occupied) to {} subscriber(s)",
        count,
        bytes,
        tree.occupied_leaf_count(),
        subscribers
      );
    });
    true
  }
}

fn publish_synthetic_map(time: Res<Time>, mut publisher: ResMut<MapPublisher>) {
  // Publish once right away, then on every timer tick.
  let due = publisher.timer.tick(time.delta()).just_finished() || !publisher.started;
  if due && publisher.spawn_publish() {
    publisher.started = true;
  } else if due {
    debug!("[SyntheticMap] previous map still building, skipping");
  }
}

/// Surface height (meters) of the terrain at `(x, y)`.
pub fn terrain_height(x: f64, y: f64, phase: f64) -> f64 {
  1.0 + (x * 0.45 + phase).sin() * 0.9 + (y * 0.3 - phase * 0.5).cos() * 0.6
}

/// Square terrain patch centered on the origin, pruned.
///
/// Cells above the surface are marked free up to one meter, so the stream
/// carries both kinds of leaves.
pub fn build_terrain(config: &SceneConfig, phase: f64) -> OccupancyTree {
  let resolution = config.resolution;
  let mut tree = OccupancyTree::new(resolution, config.tree_depth);
  let cells = (config.extent / resolution).round().max(1.0) as i64;
  let half = cells / 2;

  for ix in -half..half {
    for iy in -half..half {
      let x = (ix as f64 + 0.5) * resolution;
      let y = (iy as f64 + 0.5) * resolution;
      let surface = terrain_height(x, y, phase);

      for layer in 0..SURFACE_THICKNESS {
        let z = surface - layer as f64 * resolution;
        tree.insert_point(DVec3::new(x, y, z), true);
      }
      tree.insert_point(DVec3::new(x, y, surface + 1.0), false);
    }
  }
  tree.prune();
  tree
}

#[cfg(test)]
mod tests {
  use octomap_cloud::OctreeDecoder;

  use super::*;

  fn small_scene() -> SceneConfig {
    SceneConfig {
      extent: 2.0,
      resolution: 0.25,
      ..SceneConfig::default()
    }
  }

  #[test]
  fn test_terrain_has_occupied_and_free_cells() {
    let tree = build_terrain(&small_scene(), 0.0);
    assert!(tree.occupied_leaf_count() > 0);
    assert!(tree.free_leaf_count() > 0);
  }

  #[test]
  fn test_terrain_decodes() {
    let snapshot = build_terrain(&small_scene(), 1.0).to_snapshot("map");
    let mut voxels = Vec::new();
    let stats = OctreeDecoder::new()
      .decode(&snapshot, 15, &mut voxels)
      .unwrap();
    assert!(stats.voxels > 0);
    assert_eq!(stats.voxels, voxels.len());
  }

  #[test]
  fn test_publish_runs_off_thread() {
    let bus = Arc::new(LocalBus::new());
    let mut publisher = MapPublisher {
      bus,
      topic: "octomap_binary".to_string(),
      config: small_scene(),
      timer: Timer::from_seconds(1.0, TimerMode::Repeating),
      phase: 0.0,
      started: false,
      building: Arc::new(AtomicBool::new(false)),
      published: Arc::new(AtomicU64::new(0)),
    };

    assert!(publisher.spawn_publish());
    let mut done = false;
    for _ in 0..5000 {
      if publisher.published() == 1 && !publisher.building.load(Ordering::Acquire) {
        done = true;
        break;
      }
      std::thread::sleep(std::time::Duration::from_millis(1));
    }
    assert!(done);
    assert!(publisher.spawn_publish());
  }

  #[test]
  fn test_build_in_flight_is_not_doubled() {
    let mut publisher = MapPublisher {
      bus: Arc::new(LocalBus::new()),
      topic: "octomap_binary".to_string(),
      config: small_scene(),
      timer: Timer::from_seconds(1.0, TimerMode::Repeating),
      phase: 0.0,
      started: true,
      building: Arc::new(AtomicBool::new(true)),
      published: Arc::new(AtomicU64::new(0)),
    };
    assert!(!publisher.spawn_publish());
    assert_eq!(publisher.phase, 0.0);
  }

  #[test]
  fn test_phase_moves_terrain() {
    let config = small_scene();
    assert_ne!(
      build_terrain(&config, 0.0).to_bytes(),
      build_terrain(&config, 1.0).to_bytes()
    );
  }
}
