//! Configuration of a runtime reporter.

use std::time::Duration;

use crate::constants::{
    DEFAULT_HEARTBEAT_DELAY, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_PREFIX, NULL_TAG_VAL,
    RUNTIME_COMPONENT,
};

/// Naming and scheduling constants of a reporter.
///
/// The defaults match what the Wavefront application agent uses.  They are
/// injected into the reporter rather than read from globals, so they can be
/// overridden, typically to speed up heartbeats in tests.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wavefront_runtime_reporter::ReporterDefaults;
///
/// let defaults = ReporterDefaults {
///     heartbeat_interval: Duration::from_secs(5),
///     ..Default::default()
/// };
/// assert_eq!(defaults.prefix, "app-agent");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReporterDefaults {
    /// Prefix of every runtime metric name.
    ///
    /// Default: `app-agent`
    pub prefix: String,

    /// Tag value reported for a missing cluster or shard.
    ///
    /// Default: `none`
    pub null_tag_value: String,

    /// Component name the heartbeat is sent for.
    ///
    /// Default: `runtime`
    pub component: String,

    /// Time between two heartbeats.
    ///
    /// Default: 60 seconds
    pub heartbeat_interval: Duration,

    /// Time between building the reporter and its first heartbeat.
    ///
    /// Default: 1 second
    pub heartbeat_delay: Duration,
}

impl Default for ReporterDefaults {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.into(),
            null_tag_value: NULL_TAG_VAL.into(),
            component: RUNTIME_COMPONENT.into(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_delay: DEFAULT_HEARTBEAT_DELAY,
        }
    }
}

/// The validated configuration of a [`RuntimeReporter`](crate::RuntimeReporter).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReporterConfig {
    pub(crate) reporting_interval_secs: u32,
    pub(crate) source: String,
    pub(crate) defaults: ReporterDefaults,
}

impl ReporterConfig {
    /// How often metrics are flushed, in seconds.
    pub fn reporting_interval_secs(&self) -> u32 {
        self.reporting_interval_secs
    }

    /// How often metrics are flushed.
    pub fn reporting_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.reporting_interval_secs))
    }

    /// The source metrics and heartbeats are reported for.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Prefix of every runtime metric name.
    pub fn prefix(&self) -> &str {
        &self.defaults.prefix
    }

    /// The naming and scheduling constants in force.
    pub fn defaults(&self) -> &ReporterDefaults {
        &self.defaults
    }
}
