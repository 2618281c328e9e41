#![cfg(feature = "test")]

use std::time::Duration;

use wavefront_runtime_reporter::test::TestSender;
use wavefront_runtime_reporter::{ApplicationTags, ReporterBuilder, ReporterDefaults};

#[test]
fn test_captures_report() {
    let sender = TestSender::new();
    let reporter = ReporterBuilder::new(ApplicationTags::new("billing", "invoicer"))
        .with_source("host-a")
        .with_defaults(ReporterDefaults {
            heartbeat_delay: Duration::MAX,
            ..Default::default()
        })
        .build(sender.clone())
        .unwrap();

    reporter.report();
    reporter.stop();

    let points = sender.fetch_and_clear_points();
    assert!(points.iter().all(|point| point.source == "host-a"));
    assert!(points.iter().all(|point| point.name.starts_with("app-agent.")));
    assert_eq!(sender.flush_count(), 1);
    assert!(sender.fetch_and_clear_points().is_empty());
}
