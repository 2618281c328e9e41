//! The default metrics sink.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::collector::MetricCollector;
use crate::collectors;
use crate::protocol::{MetricPoint, RuntimeMetrics};
use crate::sender::MetricSender;
use crate::sink::{MetricsSink, MetricsSinkFactory, SinkConfig};
use crate::tags::PointTags;
use crate::utils::unpoison;
use crate::worker::PeriodicWorker;

/// Reports runtime metrics to Wavefront.
///
/// Every flush takes a snapshot of all registered collectors, turns each
/// metric into a [`MetricPoint`] carrying the prefix, source and point tags,
/// and hands the points to the sender.  Failed sends are logged and counted;
/// they never stop the periodic flushing.
pub struct InternalReporter {
    inner: Arc<Inner>,
    flusher: Mutex<Option<PeriodicWorker>>,
}

struct Inner {
    prefix: String,
    source: String,
    point_tags: Arc<PointTags>,
    sender: Arc<dyn MetricSender>,
    collectors: Vec<Arc<dyn MetricCollector>>,
}

impl InternalReporter {
    /// Creates a reporter from a sink configuration.
    ///
    /// The built-in runtime collectors are registered first when
    /// `include_runtime_metrics` is set, followed by the configured ones.
    pub fn new(config: &SinkConfig, sender: Arc<dyn MetricSender>) -> Self {
        let mut collectors: Vec<Arc<dyn MetricCollector>> = Vec::new();
        if config.include_runtime_metrics {
            collectors.extend(collectors::runtime_collectors());
        }
        collectors.extend(config.collectors.iter().cloned());

        InternalReporter {
            inner: Arc::new(Inner {
                prefix: config.prefix.clone(),
                source: config.source.clone(),
                point_tags: config.point_tags.clone(),
                sender,
                collectors,
            }),
            flusher: Mutex::new(None),
        }
    }

    /// Takes a snapshot of all collectors without sending it.
    pub fn collect_snapshot(&self) -> RuntimeMetrics {
        self.inner.collect_snapshot()
    }

    /// Returns `true` while the periodic flusher is running.
    pub fn is_running(&self) -> bool {
        unpoison(self.flusher.lock()).is_some()
    }
}

impl Inner {
    fn collect_snapshot(&self) -> RuntimeMetrics {
        let mut snapshot = RuntimeMetrics::new();
        for collector in &self.collectors {
            snapshot.extend_metrics(collector.collect());
        }
        snapshot
    }

    fn flush(&self) {
        let snapshot = self.collect_snapshot();
        let total = snapshot.metrics.len();
        let mut failed = 0;
        for metric in &snapshot.metrics {
            let point = MetricPoint::from_runtime_metric(
                metric,
                &self.prefix,
                &self.source,
                &self.point_tags,
                snapshot.timestamp,
            );
            if let Err(err) = self.sender.send_metric(point) {
                failed += 1;
                wavefront_debug!("[InternalReporter] failed to send {}: {}", metric.name, err);
            }
        }
        if failed > 0 {
            wavefront_warn!(
                "[InternalReporter] {} of {} metrics could not be sent",
                failed,
                total
            );
        }

        if let Err(err) = self.sender.flush() {
            wavefront_warn!("[InternalReporter] failed to flush sender: {}", err);
        }
        wavefront_debug!("[InternalReporter] reported {} metrics", total - failed);
    }
}

impl MetricsSink for InternalReporter {
    fn start(&self, interval: Duration) {
        let mut flusher = unpoison(self.flusher.lock());
        if flusher.is_some() {
            wavefront_debug!("[InternalReporter] already started");
            return;
        }
        let inner = self.inner.clone();
        *flusher = PeriodicWorker::spawn("wavefront-metrics-flusher", interval, interval, move || {
            inner.flush()
        });
        wavefront_debug!("[InternalReporter] flushing every {:?}", interval);
    }

    fn stop(&self) {
        let flusher = unpoison(self.flusher.lock()).take();
        if let Some(mut flusher) = flusher {
            flusher.shutdown();
        }
    }

    fn report(&self) {
        self.inner.flush();
    }
}

impl Drop for InternalReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for InternalReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalReporter")
            .field("prefix", &self.inner.prefix)
            .field("source", &self.inner.source)
            .field("point_tags", &self.inner.point_tags)
            .field("collectors_count", &self.inner.collectors.len())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Creates [`InternalReporter`] sinks.  This is the default sink factory.
#[derive(Clone, Copy, Debug, Default)]
pub struct InternalReporterFactory;

impl MetricsSinkFactory for InternalReporterFactory {
    fn create_sink(
        &self,
        config: &SinkConfig,
        sender: Arc<dyn MetricSender>,
    ) -> Arc<dyn MetricsSink> {
        Arc::new(InternalReporter::new(config, sender))
    }
}
