//! Metric types exchanged between collectors, sinks and senders.

use std::collections::BTreeMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::tags::PointTags;

/// A snapshot of runtime metrics taken from all collectors at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeMetrics {
    /// When the snapshot was taken.
    pub timestamp: SystemTime,

    /// The collected metrics.
    pub metrics: Vec<RuntimeMetric>,
}

impl RuntimeMetrics {
    /// Creates an empty snapshot stamped with the current time.
    pub fn new() -> Self {
        Self {
            timestamp: SystemTime::now(),
            metrics: Vec::new(),
        }
    }

    /// Extends the snapshot with multiple metrics.
    pub fn extend_metrics(&mut self, metrics: impl IntoIterator<Item = RuntimeMetric>) {
        self.metrics.extend(metrics);
    }

    /// Returns true if there are no metrics.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl Default for RuntimeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A single runtime metric measurement, before prefixing and tagging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeMetric {
    /// Metric name relative to the reporter prefix (e.g. `runtime.memory.rss`).
    pub name: String,

    /// The type of metric.
    #[serde(rename = "type")]
    pub metric_type: MetricType,

    /// The metric value.
    pub value: MetricValue,

    /// Unit of measurement (e.g. `bytes`, `count`, `milliseconds`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Tags specific to this metric.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl RuntimeMetric {
    /// Creates a new gauge metric.
    pub fn gauge(name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self::new(name, MetricType::Gauge, value)
    }

    /// Creates a new counter metric.
    pub fn counter(name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self::new(name, MetricType::Counter, value)
    }

    fn new(
        name: impl Into<String>,
        metric_type: MetricType,
        value: impl Into<MetricValue>,
    ) -> Self {
        Self {
            name: name.into(),
            metric_type,
            value: value.into(),
            unit: None,
            tags: BTreeMap::new(),
        }
    }

    /// Sets the unit for this metric.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Adds a tag to this metric.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// The type of metric being recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// A point-in-time value that can go up or down.
    Gauge,
    /// A monotonically increasing value.
    Counter,
}

/// Metric value supporting both integers and floats.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
}

impl MetricValue {
    /// The value as a float, which is what the backend stores.
    pub fn as_f64(self) -> f64 {
        match self {
            MetricValue::Int(v) => v as f64,
            MetricValue::Float(v) => v,
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<i32> for MetricValue {
    fn from(v: i32) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

/// A fully resolved point as handed to a [`MetricSender`](crate::MetricSender).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricPoint {
    /// The full metric name, including the reporter prefix.
    pub name: String,
    /// The value.
    pub value: f64,
    /// When the value was observed.
    pub timestamp: SystemTime,
    /// The host or container the value belongs to.
    pub source: String,
    /// Point tags merged with the metric's own tags.
    pub tags: BTreeMap<String, String>,
}

impl MetricPoint {
    /// Resolves a collected metric into a point.
    ///
    /// The metric name is joined to `prefix` with a `.`.  Point tags take
    /// precedence over tags of the same name on the metric.
    pub fn from_runtime_metric(
        metric: &RuntimeMetric,
        prefix: &str,
        source: &str,
        point_tags: &PointTags,
        timestamp: SystemTime,
    ) -> Self {
        let name = if prefix.is_empty() {
            metric.name.clone()
        } else {
            format!("{prefix}.{}", metric.name)
        };
        let mut tags = metric.tags.clone();
        tags.extend(point_tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            name,
            value: metric.value.as_f64(),
            timestamp,
            source: source.to_owned(),
            tags,
        }
    }
}
