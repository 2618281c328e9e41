//! Metric collector trait.

use crate::protocol::RuntimeMetric;

/// Source of runtime metrics for the [`InternalReporter`](crate::InternalReporter).
///
/// Implement this trait to report application-specific values next to the
/// built-in runtime metrics.
///
/// # Example
///
/// ```rust
/// use wavefront_runtime_reporter::{MetricCollector, RuntimeMetric};
///
/// struct QueueDepthCollector;
///
/// impl MetricCollector for QueueDepthCollector {
///     fn collect(&self) -> Vec<RuntimeMetric> {
///         vec![RuntimeMetric::gauge("queue.depth", 12_i64).with_unit("count")]
///     }
///
///     fn name(&self) -> &'static str {
///         "queue-depth"
///     }
/// }
/// ```
pub trait MetricCollector: Send + Sync + 'static {
    /// Collect metrics and return them.
    ///
    /// Called on every flush, from the flusher thread or from the caller of
    /// `report`.  It should be fast and non-blocking.
    fn collect(&self) -> Vec<RuntimeMetric>;

    /// Name of this collector for logging.
    fn name(&self) -> &'static str;
}
