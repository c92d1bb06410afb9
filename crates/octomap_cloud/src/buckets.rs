//! DepthBucketSet - per-depth point buckets with a double-buffered handoff.
//!
//! ```text
//!   decode context                          render tick
//!   ──────────────                          ───────────
//!   begin_decode()
//!   push() ... push()     ┌──────────────────────────────┐
//!        │                │ DisplayHandoff (one mutex)   │
//!        │  commit ──────►│   display: Arc<Generation>   │──► take_display_snapshot()
//!        │                │   new_data: bool             │      NoChange | Changed(Arc)
//!        ◄── recycled ────│   epoch: u64                 │
//!   staging               └──────────────────────────────┘
//! ```
//!
//! The staging generation is owned by the decode context and never shared.
//! The display generation is immutable while visible: the render side gets
//! an `Arc` and reads it without holding the lock. The only critical section
//! is the label exchange in [`DepthBucketSet::commit_decode`].
//!
//! An epoch cancels in-flight work: [`DisplayHandoff::invalidate`] bumps it,
//! and a staging generation begun under an older epoch is discarded at
//! commit instead of published.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::constants::MAX_DEPTH_LEVELS;
use crate::types::ColoredPoint;

/// Points of one octree depth.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DepthBucket {
  depth: u8,
  edge_length: f32,
  points: Vec<ColoredPoint>,
}

impl DepthBucket {
  fn new(depth: u8) -> Self {
    Self {
      depth,
      ..Default::default()
    }
  }

  /// Depth index (also the bucket's slot).
  #[inline]
  pub fn depth(&self) -> u8 {
    self.depth
  }

  /// Edge length of every voxel in this bucket (meters).
  #[inline]
  pub fn edge_length(&self) -> f32 {
    self.edge_length
  }

  #[inline]
  pub fn points(&self) -> &[ColoredPoint] {
    &self.points
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.points.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  /// Empty the bucket for reuse, keeping its allocation.
  fn reset(&mut self, edge_length: f32) {
    self.points.clear();
    self.edge_length = edge_length;
  }

  /// Empty the bucket and give its allocation back.
  fn release(&mut self) {
    self.points = Vec::new();
    self.edge_length = 0.0;
  }
}

/// One full set of depth buckets (either staging or display).
#[derive(Clone, Debug, PartialEq)]
pub struct BucketGeneration {
  buckets: [DepthBucket; MAX_DEPTH_LEVELS],
  active_depths: usize,
}

impl Default for BucketGeneration {
  fn default() -> Self {
    Self::empty()
  }
}

impl BucketGeneration {
  /// Generation with every bucket empty and none active.
  pub fn empty() -> Self {
    Self {
      buckets: std::array::from_fn(|depth| DepthBucket::new(depth as u8)),
      active_depths: 0,
    }
  }

  /// Number of buckets (from depth 0) the last decode filled.
  #[inline]
  pub fn active_depths(&self) -> usize {
    self.active_depths
  }

  /// Bucket at `depth`.
  ///
  /// # Panics
  /// If `depth >= MAX_DEPTH_LEVELS`.
  #[inline]
  pub fn bucket(&self, depth: usize) -> &DepthBucket {
    &self.buckets[depth]
  }

  /// All 16 buckets in depth order.
  pub fn buckets(&self) -> &[DepthBucket; MAX_DEPTH_LEVELS] {
    &self.buckets
  }

  /// Total points across buckets.
  pub fn point_count(&self) -> usize {
    self.buckets.iter().map(DepthBucket::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.buckets.iter().all(DepthBucket::is_empty)
  }

  fn prepare(&mut self, active_depths: usize, edge_length: impl Fn(u8) -> f32) {
    let active_depths = active_depths.min(MAX_DEPTH_LEVELS);
    for (depth, bucket) in self.buckets.iter_mut().enumerate() {
      if depth < active_depths {
        bucket.reset(edge_length(depth as u8));
      } else {
        bucket.release();
      }
    }
    self.active_depths = active_depths;
  }

  fn push(&mut self, depth: u8, point: ColoredPoint) -> bool {
    let depth = depth as usize;
    if depth >= self.active_depths {
      return false;
    }
    self.buckets[depth].points.push(point);
    true
  }
}

/// Result of polling the display generation.
#[derive(Clone, Debug)]
pub enum DisplayUpdate {
  /// No commit since the last poll.
  NoChange,
  /// A newer generation is visible.
  Changed(Arc<BucketGeneration>),
}

impl DisplayUpdate {
  pub fn is_changed(&self) -> bool {
    matches!(self, DisplayUpdate::Changed(_))
  }
}

/// Result of committing a staging generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
  /// Staging became the display generation.
  Published,
  /// The display was invalidated after the decode began.
  Discarded,
}

struct HandoffState {
  display: Arc<BucketGeneration>,
  new_data: bool,
  epoch: u64,
}

/// Shared half of the double buffer: the display generation and its flag.
pub struct DisplayHandoff {
  state: Mutex<HandoffState>,
}

impl Default for DisplayHandoff {
  fn default() -> Self {
    Self::new()
  }
}

impl DisplayHandoff {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(HandoffState {
        display: Arc::new(BucketGeneration::empty()),
        new_data: false,
        epoch: 0,
      }),
    }
  }

  fn lock(&self) -> MutexGuard<'_, HandoffState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Current cancellation epoch.
  pub fn epoch(&self) -> u64 {
    self.lock().epoch
  }

  /// Render-tick poll. Clears the "new data" flag.
  pub fn take_display_snapshot(&self) -> DisplayUpdate {
    let mut state = self.lock();
    if !state.new_data {
      return DisplayUpdate::NoChange;
    }
    state.new_data = false;
    DisplayUpdate::Changed(Arc::clone(&state.display))
  }

  /// Current display generation, regardless of the flag.
  pub fn display(&self) -> Arc<BucketGeneration> {
    Arc::clone(&self.lock().display)
  }

  /// Drop the visible generation and cancel in-flight decodes.
  ///
  /// The flag is cleared: whoever invalidates is responsible for clearing
  /// the renderables.
  pub fn invalidate(&self) {
    let mut state = self.lock();
    state.epoch = state.epoch.wrapping_add(1);
    state.display = Arc::new(BucketGeneration::empty());
    state.new_data = false;
  }

  /// Swap `staging` in if `epoch` is still current.
  ///
  /// `Ok` carries the previous display generation, `Err` hands `staging`
  /// back untouched.
  fn publish(
    &self,
    staging: BucketGeneration,
    epoch: u64,
  ) -> Result<Arc<BucketGeneration>, BucketGeneration> {
    let mut state = self.lock();
    if state.epoch != epoch {
      return Err(staging);
    }
    let previous = std::mem::replace(&mut state.display, Arc::new(staging));
    state.new_data = true;
    Ok(previous)
  }
}

/// Decode-side owner of the staging generation.
pub struct DepthBucketSet {
  staging: BucketGeneration,
  staging_epoch: u64,
  handoff: Arc<DisplayHandoff>,
}

impl DepthBucketSet {
  pub fn new(handoff: Arc<DisplayHandoff>) -> Self {
    let staging_epoch = handoff.epoch();
    Self {
      staging: BucketGeneration::empty(),
      staging_epoch,
      handoff,
    }
  }

  pub fn handoff(&self) -> &Arc<DisplayHandoff> {
    &self.handoff
  }

  /// Staging generation (decode context only).
  pub fn staging(&self) -> &BucketGeneration {
    &self.staging
  }

  /// Reset staging for a new decode filling depths `0..active_depths`.
  ///
  /// Buckets at or beyond `active_depths` are emptied and their memory
  /// released. Records the epoch the decode belongs to.
  pub fn begin_decode(&mut self, active_depths: usize, edge_length: impl Fn(u8) -> f32) {
    let epoch = self.handoff.epoch();
    self.begin_decode_at(epoch, active_depths, edge_length);
  }

  /// [`begin_decode`](Self::begin_decode) for a decode that belongs to an
  /// epoch read earlier.
  pub fn begin_decode_at(
    &mut self,
    epoch: u64,
    active_depths: usize,
    edge_length: impl Fn(u8) -> f32,
  ) {
    self.staging_epoch = epoch;
    self.staging.prepare(active_depths, edge_length);
  }

  /// Append a point to the staging bucket at `depth`.
  ///
  /// Returns false (and drops the point) for depths outside the active range.
  #[inline]
  pub fn push(&mut self, depth: u8, point: ColoredPoint) -> bool {
    self.staging.push(depth, point)
  }

  /// Publish staging as the display generation.
  ///
  /// The previous display generation becomes the next staging when the
  /// render side no longer holds it.
  pub fn commit_decode(&mut self) -> CommitOutcome {
    let staging = std::mem::take(&mut self.staging);
    let (outcome, next) = match self.handoff.publish(staging, self.staging_epoch) {
      Ok(previous) => (
        CommitOutcome::Published,
        Arc::try_unwrap(previous).unwrap_or_default(),
      ),
      Err(rejected) => (CommitOutcome::Discarded, rejected),
    };
    self.staging = next;
    outcome
  }

  /// Render-tick poll (see [`DisplayHandoff::take_display_snapshot`]).
  pub fn take_display_snapshot(&self) -> DisplayUpdate {
    self.handoff.take_display_snapshot()
  }
}

#[cfg(test)]
#[path = "buckets_test.rs"]
mod buckets_test;
