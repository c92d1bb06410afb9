//! Snapshot update pipeline.
//!
//! ```text
//! ┌───────────┐     ┌───────────────┐     ┌──────────────┐     ┌────────────────┐
//! │ Transport ├────►│ SnapshotQueue ├────►│ DecodeWorker ├────►│ UpdatePipeline │
//! └───────────┘     └───────────────┘     └──────────────┘     └───────┬────────┘
//!   deliver()         drop-oldest           rayon drain                │ commit
//!                                           (one per queue)            ▼
//!                                                               DisplayHandoff ──► render tick
//! ```
//!
//! # Stages
//!
//! 1. **Inbound**: bounded queue, never blocks the producer
//! 2. **Worker**: drains the queue off the render thread, one snapshot at a time
//! 3. **Update**: frame lookup, decode, colorize, bucket, commit

pub mod inbound;
pub mod update;
pub mod worker;

// Test utilities
#[cfg(test)]
pub mod test_utils;

// Re-exports
pub use inbound::{SnapshotQueue, SnapshotSender};
pub use update::{DecodeSettings, LatestSnapshot, ProcessOutcome, SharedSettings, UpdatePipeline};
pub use worker::{DecodeWorker, WorkerMode};
