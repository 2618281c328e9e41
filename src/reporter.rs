//! The runtime reporter and its builder.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::application::ApplicationTags;
use crate::collector::MetricCollector;
use crate::config::{ReporterConfig, ReporterDefaults};
use crate::constants::{DEFAULT_REPORTING_INTERVAL_SECS, UNKNOWN_SOURCE};
use crate::error::{ConfigError, HostResolutionError};
use crate::heartbeat::{Heartbeat, HeartbeaterService};
use crate::internal::InternalReporterFactory;
use crate::sender::MetricSender;
use crate::sink::{MetricsSink, MetricsSinkFactory, SinkConfig};
use crate::tags::{compose_point_tags, PointTags};
use crate::utils::{resolve_local_hostname, unpoison};

type HostResolver = Arc<dyn Fn() -> Result<String, HostResolutionError> + Send + Sync>;

/// The lifecycle state of a [`RuntimeReporter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReporterState {
    /// Built, metrics are not flushed periodically yet.
    Created,
    /// Metrics are flushed periodically.
    Started,
    /// Flushing and heartbeats have been shut down for good.
    Stopped,
}

/// Builds a [`RuntimeReporter`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wavefront_runtime_reporter::{
///     ApplicationTags, MetricPoint, MetricSender, ReporterBuilder, SendError,
/// };
///
/// struct NullSender;
///
/// impl MetricSender for NullSender {
///     fn send_metric(&self, _point: MetricPoint) -> Result<(), SendError> {
///         Ok(())
///     }
/// }
///
/// let reporter = ReporterBuilder::new(ApplicationTags::new("billing", "invoicer"))
///     .with_interval(30)
///     .with_source("host-a")
///     .build(Arc::new(NullSender))
///     .unwrap();
///
/// assert_eq!(reporter.config().reporting_interval_secs(), 30);
/// assert_eq!(reporter.point_tags().get("cluster"), Some("none"));
/// reporter.close();
/// ```
#[derive(Clone)]
pub struct ReporterBuilder {
    application: ApplicationTags,
    reporting_interval_secs: u32,
    source: Option<String>,
    defaults: ReporterDefaults,
    sink_factory: Arc<dyn MetricsSinkFactory>,
    collectors: Vec<Arc<dyn MetricCollector>>,
    host_resolver: HostResolver,
}

impl ReporterBuilder {
    /// Creates a builder for the given application.
    pub fn new(application: ApplicationTags) -> Self {
        ReporterBuilder {
            application,
            reporting_interval_secs: DEFAULT_REPORTING_INTERVAL_SECS,
            source: None,
            defaults: ReporterDefaults::default(),
            sink_factory: Arc::new(InternalReporterFactory),
            collectors: Vec::new(),
            host_resolver: Arc::new(resolve_local_hostname),
        }
    }

    /// Sets how often metrics are flushed, in seconds.
    ///
    /// Default: 60
    #[must_use]
    pub fn with_interval(mut self, seconds: u32) -> Self {
        self.reporting_interval_secs = seconds;
        self
    }

    /// Sets the source (host) metrics are reported for.
    ///
    /// When not set, the local host name is used.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Overrides the naming and scheduling constants.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ReporterDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Replaces the factory creating the metrics sink.
    #[must_use]
    pub fn with_sink_factory(mut self, factory: Arc<dyn MetricsSinkFactory>) -> Self {
        self.sink_factory = factory;
        self
    }

    /// Adds a collector whose metrics are reported next to the runtime ones.
    #[must_use]
    pub fn add_collector<C: MetricCollector>(mut self, collector: C) -> Self {
        self.collectors.push(Arc::new(collector));
        self
    }

    /// Replaces the function used to look up the local host name.
    #[must_use]
    pub fn with_host_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn() -> Result<String, HostResolutionError> + Send + Sync + 'static,
    {
        self.host_resolver = Arc::new(resolver);
        self
    }

    /// Builds the reporter.
    ///
    /// Heartbeats start right away; metric flushing starts with
    /// [`RuntimeReporter::start`].  Fails without starting anything if the
    /// application metadata, the interval or an explicit source is invalid.
    /// A failed host name lookup is not an error: the reporter then uses the
    /// `unknown` source.
    pub fn build(&self, sender: Arc<dyn MetricSender>) -> Result<RuntimeReporter, ConfigError> {
        let point_tags = Arc::new(compose_point_tags(
            &self.application,
            &self.defaults.null_tag_value,
        )?);
        if self.reporting_interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        let source = match self.source {
            Some(ref source) if source.trim().is_empty() => return Err(ConfigError::EmptySource),
            Some(ref source) => source.clone(),
            None => self.resolve_source(),
        };

        let config = ReporterConfig {
            reporting_interval_secs: self.reporting_interval_secs,
            source,
            defaults: self.defaults.clone(),
        };

        let sink = self.sink_factory.create_sink(
            &SinkConfig {
                prefix: config.prefix().to_owned(),
                source: config.source.clone(),
                point_tags: point_tags.clone(),
                include_runtime_metrics: true,
                collectors: self.collectors.clone(),
            },
            sender.clone(),
        );
        let heartbeat = HeartbeaterService::with_defaults(
            sender,
            &self.application,
            [config.defaults.component.clone()],
            config.source.clone(),
            &config.defaults,
        );

        wavefront_debug!(
            "[ReporterBuilder] built reporter for {}/{} on {}",
            self.application.application(),
            self.application.service(),
            config.source
        );
        Ok(RuntimeReporter::from_parts(
            config,
            point_tags,
            sink,
            Box::new(heartbeat),
        ))
    }

    fn resolve_source(&self) -> String {
        match (self.host_resolver)() {
            Ok(name) if !name.trim().is_empty() => name,
            Ok(_) => {
                wavefront_debug!("[ReporterBuilder] local host name is empty, using `unknown`");
                UNKNOWN_SOURCE.to_owned()
            }
            Err(err) => {
                wavefront_debug!("[ReporterBuilder] {}, using `unknown` as source", err);
                UNKNOWN_SOURCE.to_owned()
            }
        }
    }
}

impl fmt::Debug for ReporterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterBuilder")
            .field("application", &self.application)
            .field("reporting_interval_secs", &self.reporting_interval_secs)
            .field("source", &self.source)
            .field("defaults", &self.defaults)
            .field("collectors_count", &self.collectors.len())
            .finish()
    }
}

/// Reports runtime metrics and heartbeats of an application.
///
/// Created by [`ReporterBuilder::build`].  The heartbeat runs from the moment
/// the reporter is built until it is stopped; metrics are flushed between
/// [`start`](Self::start) and [`stop`](Self::stop).  Dropping the reporter
/// stops it.
///
/// Stopping first halts metric flushing and only then closes the heartbeat.
pub struct RuntimeReporter {
    config: ReporterConfig,
    point_tags: Arc<PointTags>,
    sink: Arc<dyn MetricsSink>,
    heartbeat: Box<dyn Heartbeat>,
    state: Mutex<ReporterState>,
}

impl RuntimeReporter {
    pub(crate) fn from_parts(
        config: ReporterConfig,
        point_tags: Arc<PointTags>,
        sink: Arc<dyn MetricsSink>,
        heartbeat: Box<dyn Heartbeat>,
    ) -> Self {
        RuntimeReporter {
            config,
            point_tags,
            sink,
            heartbeat,
            state: Mutex::new(ReporterState::Created),
        }
    }

    /// Starts flushing metrics every reporting interval.
    ///
    /// Returns immediately.  Calling this on a started reporter does
    /// nothing, and a stopped reporter cannot be restarted.
    pub fn start(&self) {
        let mut state = unpoison(self.state.lock());
        match *state {
            ReporterState::Created => {
                self.sink.start(self.config.reporting_interval());
                *state = ReporterState::Started;
                wavefront_debug!(
                    "[RuntimeReporter] started, reporting every {}s",
                    self.config.reporting_interval_secs
                );
            }
            ReporterState::Started => {
                wavefront_debug!("[RuntimeReporter] already started");
            }
            ReporterState::Stopped => {
                wavefront_debug!("[RuntimeReporter] cannot start a stopped reporter");
            }
        }
    }

    /// Stops flushing metrics, then stops the heartbeat.
    ///
    /// No final flush is made; call [`report`](Self::report) first if the
    /// latest values matter.  Stopping more than once is a no-op.
    pub fn stop(&self) {
        let mut state = unpoison(self.state.lock());
        if *state == ReporterState::Stopped {
            return;
        }
        *state = ReporterState::Stopped;
        self.sink.stop();
        self.heartbeat.close();
        wavefront_debug!("[RuntimeReporter] stopped");
    }

    /// Same as [`stop`](Self::stop).
    pub fn close(&self) {
        self.stop();
    }

    /// Flushes the current metrics right away, in any state.
    ///
    /// This does not move the schedule of the periodic flushes.
    pub fn report(&self) {
        self.sink.report();
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ReporterState {
        *unpoison(self.state.lock())
    }

    /// The configuration this reporter was built with.
    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// The point tags attached to every metric.
    pub fn point_tags(&self) -> &PointTags {
        &self.point_tags
    }
}

impl Drop for RuntimeReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for RuntimeReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeReporter")
            .field("config", &self.config)
            .field("point_tags", &self.point_tags)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::test::TestSender;

    #[derive(Default)]
    struct EventLog(Mutex<Vec<&'static str>>);

    impl EventLog {
        fn push(&self, event: &'static str) {
            self.0.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    struct RecordingSink(Arc<EventLog>);

    impl MetricsSink for RecordingSink {
        fn start(&self, _interval: Duration) {
            self.0.push("sink.start");
        }

        fn stop(&self) {
            self.0.push("sink.stop");
        }

        fn report(&self) {
            self.0.push("sink.report");
        }
    }

    struct RecordingHeartbeat(Arc<EventLog>);

    impl Heartbeat for RecordingHeartbeat {
        fn close(&self) {
            self.0.push("heartbeat.close");
        }
    }

    fn recording_reporter() -> (RuntimeReporter, Arc<EventLog>) {
        let log = Arc::new(EventLog::default());
        let config = ReporterConfig {
            reporting_interval_secs: 30,
            source: "host-a".into(),
            defaults: ReporterDefaults::default(),
        };
        let reporter = RuntimeReporter::from_parts(
            config,
            Arc::new(PointTags::default()),
            Arc::new(RecordingSink(log.clone())),
            Box::new(RecordingHeartbeat(log.clone())),
        );
        (reporter, log)
    }

    #[test]
    fn test_teardown_order() {
        let (reporter, log) = recording_reporter();
        reporter.start();
        reporter.stop();
        assert_eq!(log.events(), ["sink.start", "sink.stop", "heartbeat.close"]);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (reporter, log) = recording_reporter();
        reporter.start();
        reporter.stop();
        reporter.close();
        reporter.stop();
        drop(reporter);
        assert_eq!(log.events(), ["sink.start", "sink.stop", "heartbeat.close"]);
    }

    #[test]
    fn test_stop_without_start_closes_heartbeat() {
        let (reporter, log) = recording_reporter();
        reporter.stop();
        assert_eq!(reporter.state(), ReporterState::Stopped);
        assert_eq!(log.events(), ["sink.stop", "heartbeat.close"]);
    }

    #[test]
    fn test_double_start_is_noop() {
        let (reporter, log) = recording_reporter();
        reporter.start();
        reporter.start();
        assert_eq!(reporter.state(), ReporterState::Started);
        assert_eq!(log.events(), ["sink.start"]);
    }

    #[test]
    fn test_start_after_stop_is_ignored() {
        let (reporter, log) = recording_reporter();
        reporter.stop();
        reporter.start();
        assert_eq!(reporter.state(), ReporterState::Stopped);
        assert_eq!(log.events(), ["sink.stop", "heartbeat.close"]);
    }

    #[test]
    fn test_report_in_any_state() {
        let (reporter, log) = recording_reporter();
        reporter.report();
        reporter.start();
        reporter.report();
        reporter.stop();
        reporter.report();
        assert_eq!(
            log.events(),
            [
                "sink.report",
                "sink.start",
                "sink.report",
                "sink.stop",
                "heartbeat.close",
                "sink.report"
            ]
        );
    }

    #[test]
    fn test_drop_stops() {
        let (reporter, log) = recording_reporter();
        reporter.start();
        drop(reporter);
        assert_eq!(log.events(), ["sink.start", "sink.stop", "heartbeat.close"]);
    }

    #[test]
    fn test_explicit_source_skips_resolution() {
        let lookups = Arc::new(AtomicUsize::new(0));
        let counter = lookups.clone();
        let reporter = ReporterBuilder::new(ApplicationTags::new("billing", "invoicer"))
            .with_source("host-A")
            .with_host_resolver(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("resolved".into())
            })
            .build(TestSender::new())
            .unwrap();

        assert_eq!(reporter.config().source(), "host-A");
        assert_eq!(lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failed_resolution_falls_back_to_unknown() {
        let reporter = ReporterBuilder::new(ApplicationTags::new("billing", "invoicer"))
            .with_host_resolver(|| {
                Err(HostResolutionError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "no network",
                )))
            })
            .build(TestSender::new())
            .unwrap();

        assert_eq!(reporter.config().source(), "unknown");
    }

    #[test]
    fn test_empty_resolution_falls_back_to_unknown() {
        let reporter = ReporterBuilder::new(ApplicationTags::new("billing", "invoicer"))
            .with_host_resolver(|| Ok(String::new()))
            .build(TestSender::new())
            .unwrap();

        assert_eq!(reporter.config().source(), "unknown");
    }

    #[test]
    fn test_resolved_source() {
        let reporter = ReporterBuilder::new(ApplicationTags::new("billing", "invoicer"))
            .with_host_resolver(|| Ok("build-host".into()))
            .build(TestSender::new())
            .unwrap();

        assert_eq!(reporter.config().source(), "build-host");
    }

    #[test]
    fn test_configuration_errors() {
        let sender: Arc<dyn MetricSender> = TestSender::new();
        let app = ApplicationTags::new("billing", "invoicer");

        let err = ReporterBuilder::new(ApplicationTags::new("", "invoicer"))
            .build(sender.clone())
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingApplication);

        let err = ReporterBuilder::new(app.clone())
            .with_interval(0)
            .build(sender.clone())
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidInterval);

        let err = ReporterBuilder::new(app)
            .with_source(" ")
            .build(sender)
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptySource);
    }

    #[test]
    fn test_failed_build_creates_no_sink() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let factory = move |config: &SinkConfig, sender: Arc<dyn MetricSender>| {
            counter.fetch_add(1, Ordering::SeqCst);
            InternalReporterFactory.create_sink(config, sender)
        };

        let result = ReporterBuilder::new(ApplicationTags::new("billing", ""))
            .with_sink_factory(Arc::new(factory))
            .build(TestSender::new());

        assert_eq!(result.unwrap_err(), ConfigError::MissingService);
        assert_eq!(created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sink_config() {
        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        let factory = move |config: &SinkConfig, sender: Arc<dyn MetricSender>| {
            *slot.lock().unwrap() = Some(config.clone());
            InternalReporterFactory.create_sink(config, sender)
        };

        let reporter = ReporterBuilder::new(ApplicationTags::new("billing", "invoicer"))
            .with_source("host-a")
            .with_sink_factory(Arc::new(factory))
            .build(TestSender::new())
            .unwrap();

        let config = seen.lock().unwrap().take().unwrap();
        assert_eq!(config.prefix, "app-agent");
        assert_eq!(config.source, "host-a");
        assert!(config.include_runtime_metrics);
        assert_eq!(&*config.point_tags, reporter.point_tags());
    }

    #[test]
    fn test_rebuild_gives_independent_reporters() {
        let builder = ReporterBuilder::new(ApplicationTags::new("billing", "invoicer"))
            .with_source("host-a");
        let first = builder.build(TestSender::new()).unwrap();
        let second = builder.build(TestSender::new()).unwrap();

        first.start();
        first.stop();
        assert_eq!(first.state(), ReporterState::Stopped);
        assert_eq!(second.state(), ReporterState::Created);
    }
}
