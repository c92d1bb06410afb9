//! octomap_cloud - Framework/engine independent octomap point-cloud display
//!
//! This crate turns serialized occupancy octrees into per-depth colored point
//! clouds. Decoding runs off the render thread; the render thread only picks
//! up finished generations and forwards them to a [`PointCloudSink`].
//!
//! # Features
//!
//! - **Binary octree decoding**: 2 bits per child, depth-first, with
//!   aggregation of everything below a configurable maximum depth
//! - **Height coloring**: HSV hue ramp over the decoded height range
//! - **Depth buckets**: one cloud per depth, double buffered between the
//!   decode context and the renderer
//! - **Bounded inbound queue**: drop-oldest buffering, decodes serialized in
//!   arrival order
//!
//! # Example
//!
//! ```ignore
//! use octomap_cloud::{CloudConfig, LocalBus, OctomapCloudController, StaticFrames, NullSink};
//!
//! let bus = Arc::new(LocalBus::new());
//! let mut controller = OctomapCloudController::new(
//!     CloudConfig::default(),
//!     bus.clone(),
//!     Arc::new(StaticFrames::new("map")),
//! );
//! controller.on_enable();
//!
//! bus.publish("octomap_binary", snapshot);
//!
//! // Once per frame:
//! controller.tick(&mut NullSink);
//! ```

pub mod buckets;
pub mod colorize;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod frames;
pub mod octree;
pub mod pipeline;
pub mod presentation;
pub mod stats;
pub mod status;
pub mod transport;
pub mod types;

// Re-export commonly used items
pub use buckets::{BucketGeneration, DepthBucket, DisplayHandoff, DisplayUpdate};
pub use colorize::colorize;
pub use config::CloudConfig;
pub use constants::MAX_DEPTH_LEVELS;
pub use controller::OctomapCloudController;
pub use error::{DecodeError, PipelineError, TransformError, TransportError};
pub use frames::{FrameTransformer, StaticFrames};
pub use octree::{OccupancyTree, OctreeDecoder, OctreeKey};
pub use pipeline::WorkerMode;
pub use presentation::{NullSink, PointCloudSink, RecordingSink};
pub use stats::StatsSnapshot;
pub use status::{DisplayStatus, StatusLevel};
pub use transport::{LocalBus, SnapshotTransport, SubscriptionId};
pub use types::{ColoredPoint, HeightRange, OctreeSnapshot, Rgba, SharedSnapshot};
