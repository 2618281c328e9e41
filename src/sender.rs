use std::sync::Arc;

use crate::error::SendError;
use crate::protocol::MetricPoint;

/// Delivers metric points to Wavefront.
///
/// A sender is shared between the metric flusher, the heartbeat thread and
/// callers of [`RuntimeReporter::report`](crate::RuntimeReporter::report),
/// so implementations must tolerate concurrent calls.  The wire format and
/// any retry policy are up to the implementation.
///
/// Errors are never propagated to the caller of the reporter: they are
/// logged and the next flush proceeds as usual.
pub trait MetricSender: Send + Sync + 'static {
    /// Sends a single point.
    fn send_metric(&self, point: MetricPoint) -> Result<(), SendError>;

    /// Flushes points buffered by the sender, if it buffers at all.
    fn flush(&self) -> Result<(), SendError> {
        Ok(())
    }
}

impl<T: MetricSender> MetricSender for Arc<T> {
    fn send_metric(&self, point: MetricPoint) -> Result<(), SendError> {
        (**self).send_metric(point)
    }

    fn flush(&self) -> Result<(), SendError> {
        (**self).flush()
    }
}
