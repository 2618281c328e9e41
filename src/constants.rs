use std::time::Duration;

/// The version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Point tag key carrying the application name.
pub const APPLICATION_TAG_KEY: &str = "application";
/// Point tag key carrying the service name.
pub const SERVICE_TAG_KEY: &str = "service";
/// Point tag key carrying the cluster name.
pub const CLUSTER_TAG_KEY: &str = "cluster";
/// Point tag key carrying the shard name.
pub const SHARD_TAG_KEY: &str = "shard";
/// Point tag key carrying the component name on heartbeats.
pub const COMPONENT_TAG_KEY: &str = "component";

/// The four keys every reported point carries.
pub const RESERVED_TAG_KEYS: [&str; 4] = [
    APPLICATION_TAG_KEY,
    SERVICE_TAG_KEY,
    CLUSTER_TAG_KEY,
    SHARD_TAG_KEY,
];

/// Tag value used when cluster or shard are not set.
pub const NULL_TAG_VAL: &str = "none";

/// Metric name prefix of the application agent.
pub const DEFAULT_PREFIX: &str = "app-agent";

/// Name of the runtime reporter component, used for heartbeats.
pub const RUNTIME_COMPONENT: &str = "runtime";

/// Source used when the local host name cannot be resolved.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Metric name of the heartbeat signal.
pub const HEARTBEAT_METRIC: &str = "~component.heartbeat";

/// Reporting interval used when none is configured.
pub const DEFAULT_REPORTING_INTERVAL_SECS: u32 = 60;

/// How often heartbeats are sent.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Delay before the first heartbeat after construction.
pub const DEFAULT_HEARTBEAT_DELAY: Duration = Duration::from_secs(1);
