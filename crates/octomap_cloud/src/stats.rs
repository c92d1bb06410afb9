//! Decode statistics shared between the decode context and the status view.
//!
//! Counters are lock-free atomics bumped from the decode context. Timings go
//! into a small [`RollingWindow`] behind a mutex that only the decode
//! context writes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::constants::DECODE_TIMING_WINDOW;
use crate::error::PipelineError;

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  /// Create a new rolling window with the given capacity.
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity: capacity.max(1),
    }
  }

  /// Push a new value, evicting the oldest if at capacity.
  pub fn push(&mut self, value: T) {
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  /// Get the most recent value.
  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  /// Average of all values (0 when empty).
  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      return 0.0;
    }
    self.buffer.iter().sum::<u64>() as f64 / self.buffer.len() as f64
  }

  /// Smallest and largest value.
  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = *self.buffer.iter().min()?;
    let max = *self.buffer.iter().max()?;
    Some((min, max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(DECODE_TIMING_WINDOW)
  }
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsSnapshot {
  pub messages_received: u64,
  pub decoded: u64,
  pub decode_errors: u64,
  pub transform_errors: u64,
  pub dropped_overflow: u64,
  pub discarded_stale: u64,
  pub last_decode_us: u64,
  pub avg_decode_us: f64,
  /// Fastest and slowest decode in the timing window.
  pub min_decode_us: u64,
  pub max_decode_us: u64,
  /// Why the most recent snapshot failed, cleared by the next success.
  pub last_error: Option<PipelineError>,
}

/// Counters for everything that happens to inbound snapshots.
#[derive(Debug)]
pub struct PipelineStats {
  messages_received: AtomicU64,
  decoded: AtomicU64,
  decode_errors: AtomicU64,
  transform_errors: AtomicU64,
  dropped_overflow: AtomicU64,
  discarded_stale: AtomicU64,
  decode_timings: Mutex<RollingWindow<u64>>,
  last_error: Mutex<Option<PipelineError>>,
}

impl Default for PipelineStats {
  fn default() -> Self {
    Self::new()
  }
}

impl PipelineStats {
  pub fn new() -> Self {
    Self {
      messages_received: AtomicU64::new(0),
      decoded: AtomicU64::new(0),
      decode_errors: AtomicU64::new(0),
      transform_errors: AtomicU64::new(0),
      dropped_overflow: AtomicU64::new(0),
      discarded_stale: AtomicU64::new(0),
      decode_timings: Mutex::new(RollingWindow::default()),
      last_error: Mutex::new(None),
    }
  }

  pub fn record_received(&self) {
    self.messages_received.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_dropped_overflow(&self) {
    self.dropped_overflow.fetch_add(1, Ordering::Relaxed);
  }

  /// Count a dropped snapshot and remember why.
  pub fn record_failure(&self, error: &PipelineError) {
    let counter = match error {
      PipelineError::Decode(_) => &self.decode_errors,
      PipelineError::Transform(_) => &self.transform_errors,
    };
    counter.fetch_add(1, Ordering::Relaxed);
    *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error.clone());
  }

  pub fn record_discarded_stale(&self) {
    self.discarded_stale.fetch_add(1, Ordering::Relaxed);
  }

  /// Record a published decode and how long it took.
  pub fn record_decoded(&self, timing_us: u64) {
    self.decoded.fetch_add(1, Ordering::Relaxed);
    self
      .decode_timings
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(timing_us);
    *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
  }

  pub fn messages_received(&self) -> u64 {
    self.messages_received.load(Ordering::Relaxed)
  }

  /// Snapshots that reached the end of the pipeline, whatever the outcome.
  pub fn handled(&self) -> u64 {
    [
      &self.decoded,
      &self.decode_errors,
      &self.transform_errors,
      &self.discarded_stale,
    ]
    .iter()
    .map(|counter| counter.load(Ordering::Relaxed))
    .sum()
  }

  pub fn snapshot(&self) -> StatsSnapshot {
    let timings = self
      .decode_timings
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    let (min_decode_us, max_decode_us) = timings.min_max().unwrap_or((0, 0));
    StatsSnapshot {
      messages_received: self.messages_received.load(Ordering::Relaxed),
      decoded: self.decoded.load(Ordering::Relaxed),
      decode_errors: self.decode_errors.load(Ordering::Relaxed),
      transform_errors: self.transform_errors.load(Ordering::Relaxed),
      dropped_overflow: self.dropped_overflow.load(Ordering::Relaxed),
      discarded_stale: self.discarded_stale.load(Ordering::Relaxed),
      last_decode_us: timings.last().copied().unwrap_or(0),
      avg_decode_us: timings.average(),
      min_decode_us,
      max_decode_us,
      last_error: self
        .last_error
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone(),
    }
  }
}
