//! OctomapCloudController - subscription lifecycle, configuration and the
//! per-frame render tick.
//!
//! ```text
//!                    ┌──────────────── controller (render thread) ─────────────────┐
//!  configuration ───►│ set_topic / set_queue_size  ─► unsubscribe, clear, subscribe│
//!                    │ set_max_tree_depth          ─► clear, replay latest         │
//!                    │ set_color_factor            ─► replay latest                │
//!  lifecycle ───────►│ on_enable / on_disable / reset / fixed_frame_changed        │
//!                    │                                                             │
//!  every frame ─────►│ tick(sink): pending clear ─► take_display_snapshot ─► sink  │
//!                    └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Clearing never touches renderables directly: it invalidates the display
//! and flags the next tick to clear every cloud it has shown.

use std::sync::{Arc, PoisonError, RwLock};

use crate::buckets::{DisplayHandoff, DisplayUpdate};
use crate::config::{clamp_color_factor, clamp_max_tree_depth, clamp_queue_size, CloudConfig};
use crate::constants::MAX_DEPTH_LEVELS;
use crate::error::{PipelineError, TransportError};
use crate::frames::FrameTransformer;
use crate::pipeline::{
  DecodeSettings, DecodeWorker, LatestSnapshot, SharedSettings, SnapshotQueue, SnapshotSender,
  UpdatePipeline, WorkerMode,
};
use crate::presentation::PointCloudSink;
use crate::stats::{PipelineStats, StatsSnapshot};
use crate::status::DisplayStatus;
use crate::transport::{SnapshotTransport, SubscriptionId};

/// Status entry names.
pub mod status_names {
  pub const TOPIC: &str = "Topic";
  pub const MESSAGES: &str = "Messages";
  pub const DECODE: &str = "Decode";
  pub const TRANSFORM: &str = "Transform";
}

use status_names::{DECODE, MESSAGES, TOPIC, TRANSFORM};

struct Subscription {
  id: SubscriptionId,
  queue: SnapshotQueue,
}

/// Octomap point-cloud display, independent of any engine.
pub struct OctomapCloudController {
  config: CloudConfig,
  transport: Arc<dyn SnapshotTransport>,
  worker: DecodeWorker,
  handoff: Arc<DisplayHandoff>,
  settings: SharedSettings,
  stats: Arc<PipelineStats>,
  latest: Arc<LatestSnapshot>,
  subscription: Option<Subscription>,
  enabled: bool,
  /// Depths the sink currently shows a cloud for.
  live: [bool; MAX_DEPTH_LEVELS],
  pending_clear: bool,
  /// (messages received, snapshots handled) at the last status refresh.
  reported: Option<(u64, u64)>,
  status: DisplayStatus,
}

impl OctomapCloudController {
  /// Controller decoding on rayon's pool. Starts disabled.
  pub fn new(
    config: CloudConfig,
    transport: Arc<dyn SnapshotTransport>,
    frames: Arc<dyn FrameTransformer>,
  ) -> Self {
    Self::with_worker_mode(config, transport, frames, WorkerMode::Background)
  }

  pub fn with_worker_mode(
    config: CloudConfig,
    transport: Arc<dyn SnapshotTransport>,
    frames: Arc<dyn FrameTransformer>,
    mode: WorkerMode,
  ) -> Self {
    let config = config.sanitized();
    let handoff = Arc::new(DisplayHandoff::new());
    let settings = Arc::new(RwLock::new(DecodeSettings::from(&config)));
    let stats = Arc::new(PipelineStats::new());
    let pipeline = UpdatePipeline::new(
      Arc::clone(&handoff),
      frames,
      Arc::clone(&settings),
      Arc::clone(&stats),
    );
    let latest = Arc::clone(pipeline.latest());
    Self {
      config,
      transport,
      worker: DecodeWorker::new(pipeline, mode),
      handoff,
      settings,
      stats,
      latest,
      subscription: None,
      enabled: false,
      live: [false; MAX_DEPTH_LEVELS],
      pending_clear: false,
      reported: None,
      status: DisplayStatus::new(),
    }
  }

  // ===========================================================================
  // Lifecycle
  // ===========================================================================

  pub fn on_enable(&mut self) {
    if self.enabled {
      return;
    }
    self.enabled = true;
    self.subscribe();
  }

  pub fn on_disable(&mut self) {
    if !self.enabled {
      return;
    }
    self.enabled = false;
    self.unsubscribe();
    self.clear();
  }

  /// Drop everything shown and start the subscription over. Counters are
  /// kept.
  pub fn reset(&mut self) {
    self.unsubscribe();
    self.clear();
    if self.enabled {
      self.subscribe();
    }
  }

  /// The viewer's fixed frame changed: displayed geometry is in the wrong
  /// frame now and is discarded.
  pub fn fixed_frame_changed(&mut self, frame: impl Into<String>) {
    let frame = frame.into();
    if frame == self.config.fixed_frame {
      return;
    }
    tracing::info!(frame = %frame, "fixed frame changed");
    self.config.fixed_frame = frame.clone();
    self.write_settings(|s| s.fixed_frame = frame);
    self.clear();
  }

  // ===========================================================================
  // Configuration
  // ===========================================================================

  pub fn set_topic(&mut self, topic: impl Into<String>) {
    let topic = topic.into();
    if topic == self.config.topic {
      return;
    }
    self.config.topic = topic;
    if self.enabled {
      self.unsubscribe();
      self.clear();
    }
    // After the old queue is closed, so nothing from it is accepted again.
    self.latest.clear();
    if self.enabled {
      self.subscribe();
    }
  }

  pub fn set_queue_size(&mut self, queue_size: usize) {
    let queue_size = clamp_queue_size(queue_size);
    if queue_size == self.config.queue_size {
      return;
    }
    self.config.queue_size = queue_size;
    self.resubscribe();
  }

  /// Deepest level drawn. Clears the display and redraws the latest map at
  /// the new depth.
  pub fn set_max_tree_depth(&mut self, depth: u32) {
    let depth = clamp_max_tree_depth(depth);
    if depth == self.config.max_tree_depth {
      return;
    }
    self.config.max_tree_depth = depth;
    self.write_settings(|s| s.max_tree_depth = depth);
    self.clear();
    self.replay_latest();
  }

  /// Height-to-hue scaling. Recolors the latest map.
  pub fn set_color_factor(&mut self, factor: f64) {
    let factor = clamp_color_factor(factor);
    if factor == self.config.color_factor {
      return;
    }
    self.config.color_factor = factor;
    self.write_settings(|s| s.color_factor = factor);
    self.replay_latest();
  }

  // ===========================================================================
  // Render tick
  // ===========================================================================

  /// Push new clouds to `sink`. Returns whether any sink call was made.
  ///
  /// Does nothing (no sink calls) when no decode was published since the
  /// last tick and no clear is pending.
  pub fn tick(&mut self, sink: &mut dyn PointCloudSink) -> bool {
    let mut touched = false;

    if self.pending_clear {
      self.pending_clear = false;
      for depth in 0..MAX_DEPTH_LEVELS {
        if self.live[depth] {
          sink.clear_cloud(depth as u8);
          self.live[depth] = false;
          touched = true;
        }
      }
    }

    self.refresh_status();

    if let DisplayUpdate::Changed(generation) = self.handoff.take_display_snapshot() {
      for (depth, bucket) in generation.buckets().iter().enumerate() {
        if depth < generation.active_depths() && !bucket.is_empty() {
          sink.update_cloud(depth as u8, bucket);
          self.live[depth] = true;
          touched = true;
        } else if self.live[depth] {
          sink.clear_cloud(depth as u8);
          self.live[depth] = false;
          touched = true;
        }
      }
    }

    touched
  }

  /// Decode queued snapshots on the calling thread (for
  /// [`WorkerMode::Deferred`]). Returns how many were handled.
  pub fn process_pending(&self) -> usize {
    match &self.subscription {
      Some(subscription) => self.worker.drain(&subscription.queue),
      None => 0,
    }
  }

  // ===========================================================================
  // Queries
  // ===========================================================================

  pub fn config(&self) -> &CloudConfig {
    &self.config
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  pub fn is_subscribed(&self) -> bool {
    self.subscription.is_some()
  }

  pub fn status(&self) -> &DisplayStatus {
    &self.status
  }

  pub fn stats(&self) -> StatsSnapshot {
    self.stats.snapshot()
  }

  /// Depths the sink currently shows.
  pub fn live_depths(&self) -> impl Iterator<Item = u8> + '_ {
    (0..MAX_DEPTH_LEVELS)
      .filter(|&d| self.live[d])
      .map(|d| d as u8)
  }

  // ===========================================================================
  // Internals
  // ===========================================================================

  fn subscribe(&mut self) {
    let topic = self.config.topic.clone();
    let result = if topic.trim().is_empty() {
      Err(TransportError::EmptyTopic)
    } else {
      let queue = SnapshotQueue::new(self.config.queue_size);
      let sender = SnapshotSender::new(queue.clone(), self.worker.clone(), Arc::clone(&self.stats));
      self
        .transport
        .subscribe(&topic, sender)
        .map(|id| Subscription { id, queue })
    };

    match result {
      Ok(subscription) => {
        tracing::info!(
          topic = %topic,
          queue_size = self.config.queue_size,
          "subscribed to octomap topic"
        );
        self.status.ok(TOPIC, format!("Subscribed to '{topic}'"));
        self.subscription = Some(subscription);
      }
      Err(error) => {
        tracing::warn!(topic = %topic, %error, "octomap subscription failed");
        self.status.error(TOPIC, format!("Error subscribing: {error}"));
      }
    }
  }

  fn unsubscribe(&mut self) {
    let Some(subscription) = self.subscription.take() else {
      return;
    };
    self.transport.unsubscribe(subscription.id);
    let dropped = subscription.queue.close();
    tracing::info!(
      topic = %self.config.topic,
      dropped,
      "unsubscribed from octomap topic"
    );
  }

  fn resubscribe(&mut self) {
    if !self.enabled {
      return;
    }
    self.unsubscribe();
    self.clear();
    self.subscribe();
  }

  /// Invalidate the display; renderables are cleared on the next tick.
  fn clear(&mut self) {
    self.handoff.invalidate();
    self.pending_clear = true;
  }

  /// Queue the newest accepted snapshot again so new settings show without
  /// waiting for the publisher.
  fn replay_latest(&self) {
    let Some(subscription) = &self.subscription else {
      return;
    };
    // Anything already queued is newer and picks up the settings anyway.
    if self.latest.replay_into(&subscription.queue) {
      self.worker.kick(&subscription.queue);
    }
  }

  fn write_settings(&self, update: impl FnOnce(&mut DecodeSettings)) {
    update(&mut self.settings.write().unwrap_or_else(PoisonError::into_inner));
  }

  fn refresh_status(&mut self) {
    let received = self.stats.messages_received();
    let counts = (received, self.stats.handled());
    if self.reported == Some(counts) {
      return;
    }
    self.reported = Some(counts);
    self
      .status
      .ok(MESSAGES, format!("{received} octomap messages received"));
    self.refresh_error_status();
  }

  fn refresh_error_status(&mut self) {
    match self.stats.snapshot().last_error {
      Some(PipelineError::Decode(error)) => {
        self.status.warn(DECODE, error.to_string());
        self.status.remove(TRANSFORM);
      }
      Some(PipelineError::Transform(error)) => {
        self.status.warn(TRANSFORM, error.to_string());
        self.status.remove(DECODE);
      }
      None => {
        self.status.remove(DECODE);
        self.status.remove(TRANSFORM);
      }
    }
  }
}

impl Drop for OctomapCloudController {
  fn drop(&mut self) {
    self.unsubscribe();
  }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;
