//! Liveness signal of the reporting components.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::application::ApplicationTags;
use crate::config::ReporterDefaults;
use crate::constants::{COMPONENT_TAG_KEY, HEARTBEAT_METRIC};
use crate::protocol::MetricPoint;
use crate::sender::MetricSender;
use crate::tags::identity_tags;
use crate::utils::unpoison;
use crate::worker::PeriodicWorker;

/// Periodically tells Wavefront that a set of components is alive.
///
/// The service starts beating as soon as it is created: one
/// `~component.heartbeat` point with value `1.0` per component, tagged with
/// the application identity and the component name.  It keeps beating until
/// [`close`](Self::close) is called or the service is dropped.
pub struct HeartbeaterService {
    components: Vec<String>,
    source: String,
    worker: Mutex<Option<PeriodicWorker>>,
}

impl HeartbeaterService {
    /// Starts heartbeats for `components` on the default schedule.
    pub fn new<I, S>(
        sender: Arc<dyn MetricSender>,
        application: &ApplicationTags,
        components: I,
        source: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_defaults(
            sender,
            application,
            components,
            source,
            &ReporterDefaults::default(),
        )
    }

    /// Starts heartbeats using the schedule and sentinel tag value of `defaults`.
    pub fn with_defaults<I, S>(
        sender: Arc<dyn MetricSender>,
        application: &ApplicationTags,
        components: I,
        source: impl Into<String>,
        defaults: &ReporterDefaults,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let components: Vec<String> = components.into_iter().map(Into::into).collect();
        let source = source.into();
        let beats = heartbeat_tags(application, &components, &defaults.null_tag_value);

        let worker_source = source.clone();
        let worker = PeriodicWorker::spawn(
            "wavefront-heartbeater",
            defaults.heartbeat_delay,
            defaults.heartbeat_interval,
            move || beat(sender.as_ref(), &worker_source, &beats),
        );
        wavefront_debug!(
            "[Heartbeater] started for {:?} every {:?}",
            components,
            defaults.heartbeat_interval
        );

        HeartbeaterService {
            components,
            source,
            worker: Mutex::new(worker),
        }
    }

    /// The components this service beats for.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The source heartbeats are reported for.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns `true` once the service has been closed.
    pub fn is_closed(&self) -> bool {
        unpoison(self.worker.lock()).is_none()
    }

    /// Stops sending heartbeats and waits for the heartbeat thread to exit.
    ///
    /// Closing an already closed service does nothing.
    pub fn close(&self) {
        let worker = unpoison(self.worker.lock()).take();
        if let Some(mut worker) = worker {
            worker.shutdown();
            wavefront_debug!("[Heartbeater] closed");
        }
    }
}

/// The part of a heartbeat the reporter needs for teardown.
pub(crate) trait Heartbeat: Send + Sync {
    fn close(&self);
}

impl Heartbeat for HeartbeaterService {
    fn close(&self) {
        HeartbeaterService::close(self);
    }
}

impl Drop for HeartbeaterService {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for HeartbeaterService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeartbeaterService")
            .field("components", &self.components)
            .field("source", &self.source)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn heartbeat_tags(
    application: &ApplicationTags,
    components: &[String],
    null_tag_value: &str,
) -> Vec<BTreeMap<String, String>> {
    let identity = identity_tags(application, null_tag_value);
    components
        .iter()
        .map(|component| {
            let mut tags = identity.clone();
            tags.insert(COMPONENT_TAG_KEY.to_owned(), component.clone());
            tags
        })
        .collect()
}

fn beat(sender: &dyn MetricSender, source: &str, beats: &[BTreeMap<String, String>]) {
    let timestamp = SystemTime::now();
    for tags in beats {
        let point = MetricPoint {
            name: HEARTBEAT_METRIC.to_owned(),
            value: 1.0,
            timestamp,
            source: source.to_owned(),
            tags: tags.clone(),
        };
        if let Err(err) = sender.send_metric(point) {
            wavefront_warn!("[Heartbeater] failed to send heartbeat: {}", err);
        }
    }
    if let Err(err) = sender.flush() {
        wavefront_warn!("[Heartbeater] failed to flush heartbeats: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::test::TestSender;

    fn fast_defaults() -> ReporterDefaults {
        ReporterDefaults {
            heartbeat_delay: Duration::ZERO,
            heartbeat_interval: Duration::from_millis(10),
            ..Default::default()
        }
    }

    fn wait_for_beats(sender: &TestSender, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while sender.points_named(HEARTBEAT_METRIC).len() < count && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_heartbeat_points() {
        let sender = TestSender::new();
        let app = ApplicationTags::new("billing", "invoicer").with_cluster("us-west");
        let service = HeartbeaterService::with_defaults(
            sender.clone(),
            &app,
            ["runtime"],
            "host-a",
            &fast_defaults(),
        );
        assert_eq!(service.components(), ["runtime"]);
        assert_eq!(service.source(), "host-a");

        wait_for_beats(&sender, 1);
        service.close();
        assert!(sender.flush_count() >= 1);

        let beats = sender.fetch_and_clear_points();
        assert!(!beats.is_empty());
        let beat = &beats[0];
        assert_eq!(beat.name, "~component.heartbeat");
        assert_eq!(beat.value, 1.0);
        assert_eq!(beat.source, "host-a");
        assert_eq!(beat.tags["application"], "billing");
        assert_eq!(beat.tags["service"], "invoicer");
        assert_eq!(beat.tags["cluster"], "us-west");
        assert_eq!(beat.tags["shard"], "none");
        assert_eq!(beat.tags["component"], "runtime");
    }

    #[test]
    fn test_one_beat_per_component() {
        let sender = TestSender::new();
        let app = ApplicationTags::new("billing", "invoicer");
        let service = HeartbeaterService::with_defaults(
            sender.clone(),
            &app,
            ["runtime", "http"],
            "host-a",
            &fast_defaults(),
        );

        wait_for_beats(&sender, 2);
        service.close();

        let beats = sender.fetch_and_clear_points();
        assert!(beats.iter().any(|p| p.tags["component"] == "runtime"));
        assert!(beats.iter().any(|p| p.tags["component"] == "http"));
    }

    #[test]
    fn test_identity_matches_point_tags() {
        let app = ApplicationTags::new("billing", "invoicer")
            .with_shard("eu-1")
            .with_custom_tag("team", "payments");
        let point_tags = crate::tags::compose_point_tags(&app, "n/a").unwrap();

        let beats = heartbeat_tags(&app, &["runtime".to_owned()], "n/a");
        assert_eq!(beats.len(), 1);
        for (key, value) in &beats[0] {
            if key == COMPONENT_TAG_KEY {
                assert_eq!(value, "runtime");
            } else {
                assert_eq!(point_tags.get(key), Some(value.as_str()));
            }
        }
        assert!(!beats[0].contains_key("team"));
        assert_eq!(beats[0].len(), 5);
    }

    #[test]
    fn test_unbounded_delay_never_beats() {
        let sender = TestSender::new();
        let app = ApplicationTags::new("billing", "invoicer");
        let defaults = ReporterDefaults {
            heartbeat_delay: Duration::MAX,
            ..Default::default()
        };
        let service = HeartbeaterService::with_defaults(
            sender.clone(),
            &app,
            ["runtime"],
            "host-a",
            &defaults,
        );

        thread::sleep(Duration::from_millis(30));
        assert!(!service.is_closed());
        service.close();
        assert!(service.is_closed());
        assert!(sender.fetch_and_clear_points().is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let sender = TestSender::new();
        let app = ApplicationTags::new("billing", "invoicer");
        let service = HeartbeaterService::new(sender.clone(), &app, ["runtime"], "host-a");
        assert!(!service.is_closed());

        let started = Instant::now();
        service.close();
        service.close();

        assert!(service.is_closed());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(sender.fetch_and_clear_points().is_empty());
    }

    #[test]
    fn test_no_beats_after_close() {
        let sender = TestSender::new();
        let app = ApplicationTags::new("billing", "invoicer");
        let service = HeartbeaterService::with_defaults(
            sender.clone(),
            &app,
            ["runtime"],
            "host-a",
            &fast_defaults(),
        );
        wait_for_beats(&sender, 1);
        service.close();

        sender.fetch_and_clear_points();
        thread::sleep(Duration::from_millis(50));
        assert!(sender.fetch_and_clear_points().is_empty());
    }
}
