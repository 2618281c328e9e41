//! Periodic runtime metrics and heartbeat reporting for Wavefront.
//!
//! This crate attaches a fixed set of application identity tags to a stream
//! of runtime metrics (memory, CPU time, threads, file descriptors) and
//! flushes them on a timer through a [`MetricSender`].  Independently of the
//! metric flushes it emits a periodic `~component.heartbeat` signal so the
//! backend knows the component is alive.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wavefront_runtime_reporter::{
//!     ApplicationTags, MetricPoint, MetricSender, ReporterBuilder, SendError,
//! };
//!
//! struct StdoutSender;
//!
//! impl MetricSender for StdoutSender {
//!     fn send_metric(&self, point: MetricPoint) -> Result<(), SendError> {
//!         println!("{} {} source={}", point.name, point.value, point.source);
//!         Ok(())
//!     }
//! }
//!
//! let tags = ApplicationTags::new("billing", "invoicer").with_cluster("us-west");
//! let reporter = ReporterBuilder::new(tags)
//!     .with_interval(30)
//!     .build(Arc::new(StdoutSender))
//!     .expect("invalid reporter configuration");
//!
//! reporter.start();
//! // ... run the application ...
//! reporter.stop();
//! ```
//!
//! # Lifecycles
//!
//! The two background activities owned by a [`RuntimeReporter`] do not share
//! a lifecycle.  The heartbeat starts as soon as the reporter is built and
//! lives until the reporter is stopped or dropped.  Metric flushing only runs
//! between explicit calls to [`RuntimeReporter::start`] and
//! [`RuntimeReporter::stop`].
//!
//! # Features
//!
//! - `feature = "memory"` (default): collect resident memory metrics.
//! - `feature = "process"` (default): collect process metrics (CPU time,
//!   threads, file descriptors, reporter uptime).
//! - `feature = "test"`: activates the [`test`] module with a sender that
//!   captures points for inspection.

#![warn(missing_docs)]

// macros; these need to be first to be used by other modules
#[macro_use]
mod macros;

mod application;
mod collector;
mod config;
mod constants;
mod error;
mod heartbeat;
mod internal;
mod protocol;
mod reporter;
mod sender;
mod sink;
mod tags;
mod utils;
mod worker;

pub mod collectors;

pub use crate::application::ApplicationTags;
pub use crate::collector::MetricCollector;
pub use crate::config::{ReporterConfig, ReporterDefaults};
pub use crate::constants::*;
pub use crate::error::{ConfigError, HostResolutionError, SendError};
pub use crate::heartbeat::HeartbeaterService;
pub use crate::internal::{InternalReporter, InternalReporterFactory};
pub use crate::protocol::{MetricPoint, MetricType, MetricValue, RuntimeMetric, RuntimeMetrics};
pub use crate::reporter::{ReporterBuilder, ReporterState, RuntimeReporter};
pub use crate::sender::MetricSender;
pub use crate::sink::{MetricsSink, MetricsSinkFactory, SinkConfig};
pub use crate::tags::{compose_point_tags, PointTags};
pub use crate::utils::resolve_local_hostname;
