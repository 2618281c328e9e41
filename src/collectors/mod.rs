//! Built-in runtime collectors.
//!
//! These are registered by the [`InternalReporter`](crate::InternalReporter)
//! when runtime metrics are enabled:
//! - Memory usage (`memory` feature)
//! - Process statistics (`process` feature)

#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "process")]
mod process;

#[cfg(feature = "memory")]
pub use memory::MemoryCollector;
#[cfg(feature = "process")]
pub use process::ProcessCollector;

use std::sync::Arc;

use crate::collector::MetricCollector;

/// Returns the runtime collectors enabled at compile time.
pub(crate) fn runtime_collectors() -> Vec<Arc<dyn MetricCollector>> {
    #[allow(unused_mut)]
    let mut collectors: Vec<Arc<dyn MetricCollector>> = Vec::new();

    #[cfg(feature = "memory")]
    collectors.push(Arc::new(MemoryCollector::new()));

    #[cfg(feature = "process")]
    collectors.push(Arc::new(ProcessCollector::new()));

    collectors
}
