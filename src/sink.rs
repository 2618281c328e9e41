use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::collector::MetricCollector;
use crate::sender::MetricSender;
use crate::tags::PointTags;

/// Buffers runtime metrics and flushes them to a [`MetricSender`].
///
/// The [`RuntimeReporter`](crate::RuntimeReporter) drives a sink through
/// these three calls and never touches the sender itself.  A sink is shared
/// between the reporter's flush timer and explicit `report` calls, so it must
/// tolerate `report` running concurrently with a scheduled flush.
pub trait MetricsSink: Send + Sync + 'static {
    /// Starts flushing every `interval`.
    fn start(&self, interval: Duration);

    /// Stops the periodic flushing.  Does not flush.
    fn stop(&self);

    /// Flushes the current metrics once, synchronously.
    fn report(&self);
}

/// Everything a sink needs to know about the reporter it belongs to.
#[derive(Clone)]
pub struct SinkConfig {
    /// Prefix of every metric name.
    pub prefix: String,
    /// The source (host) the metrics are reported for.
    pub source: String,
    /// The point tags of every metric.
    pub point_tags: Arc<PointTags>,
    /// Whether the built-in runtime collectors should be registered.
    pub include_runtime_metrics: bool,
    /// Application specific collectors.
    pub collectors: Vec<Arc<dyn MetricCollector>>,
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("prefix", &self.prefix)
            .field("source", &self.source)
            .field("point_tags", &self.point_tags)
            .field("include_runtime_metrics", &self.include_runtime_metrics)
            .field("collectors_count", &self.collectors.len())
            .finish()
    }
}

/// Creates the sink of a reporter.
///
/// The default factory is [`InternalReporterFactory`](crate::InternalReporterFactory).
/// This is implemented for closures taking the same arguments.
pub trait MetricsSinkFactory: Send + Sync {
    /// Creates a sink pre-configured with `config` that sends through `sender`.
    fn create_sink(&self, config: &SinkConfig, sender: Arc<dyn MetricSender>)
        -> Arc<dyn MetricsSink>;
}

impl<F> MetricsSinkFactory for F
where
    F: Fn(&SinkConfig, Arc<dyn MetricSender>) -> Arc<dyn MetricsSink> + Send + Sync,
{
    fn create_sink(
        &self,
        config: &SinkConfig,
        sender: Arc<dyn MetricSender>,
    ) -> Arc<dyn MetricsSink> {
        (*self)(config, sender)
    }
}
