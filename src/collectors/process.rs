use std::time::Instant;

use crate::collector::MetricCollector;
use crate::protocol::RuntimeMetric;

/// Collects process-level metrics.
///
/// Metrics collected, where the platform supports them:
/// - `reporter.uptime` - seconds since this collector was created, which
///   is when the reporter was built, not when the process started
/// - `process.threads.count` - number of threads
/// - `process.cpu.user_time` - user CPU time in milliseconds
/// - `process.cpu.system_time` - system CPU time in milliseconds
/// - `process.open_fds` - open file descriptors
pub struct ProcessCollector {
    started: Instant,
}

impl ProcessCollector {
    /// Creates a new process collector.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for ProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricCollector for ProcessCollector {
    fn collect(&self) -> Vec<RuntimeMetric> {
        let mut metrics = vec![
            RuntimeMetric::gauge("reporter.uptime", self.started.elapsed().as_secs())
                .with_unit("seconds"),
        ];

        if let Some(threads) = thread_count() {
            metrics.push(RuntimeMetric::gauge("process.threads.count", threads).with_unit("count"));
        }

        if let Some((user, system)) = cpu_times() {
            metrics.push(
                RuntimeMetric::counter("process.cpu.user_time", user).with_unit("milliseconds"),
            );
            metrics.push(
                RuntimeMetric::counter("process.cpu.system_time", system)
                    .with_unit("milliseconds"),
            );
        }

        if let Some(fds) = open_fds() {
            metrics.push(RuntimeMetric::gauge("process.open_fds", fds).with_unit("count"));
        }

        metrics
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

#[cfg(target_os = "linux")]
fn thread_count() -> Option<i64> {
    Some(std::fs::read_dir("/proc/self/task").ok()?.count() as i64)
}

#[cfg(not(target_os = "linux"))]
fn thread_count() -> Option<i64> {
    None
}

#[cfg(target_os = "linux")]
fn open_fds() -> Option<i64> {
    Some(std::fs::read_dir("/proc/self/fd").ok()?.count() as i64)
}

#[cfg(not(target_os = "linux"))]
fn open_fds() -> Option<i64> {
    None
}

/// User and system CPU time in milliseconds.
#[cfg(unix)]
fn cpu_times() -> Option<(i64, i64)> {
    unsafe {
        let mut usage: libc::rusage = std::mem::zeroed();
        if libc::getrusage(libc::RUSAGE_SELF, &mut usage) != 0 {
            return None;
        }
        let user = usage.ru_utime.tv_sec as i64 * 1000 + usage.ru_utime.tv_usec as i64 / 1000;
        let system = usage.ru_stime.tv_sec as i64 * 1000 + usage.ru_stime.tv_usec as i64 / 1000;
        Some((user, system))
    }
}

#[cfg(windows)]
fn cpu_times() -> Option<(i64, i64)> {
    use windows_sys::Win32::Foundation::FILETIME;
    use windows_sys::Win32::System::Threading::{GetCurrentProcess, GetProcessTimes};

    // FILETIME counts 100ns intervals
    fn millis(time: &FILETIME) -> i64 {
        ((((time.dwHighDateTime as u64) << 32) | time.dwLowDateTime as u64) / 10_000) as i64
    }

    unsafe {
        let mut creation: FILETIME = std::mem::zeroed();
        let mut exit: FILETIME = std::mem::zeroed();
        let mut kernel: FILETIME = std::mem::zeroed();
        let mut user: FILETIME = std::mem::zeroed();
        if GetProcessTimes(
            GetCurrentProcess(),
            &mut creation,
            &mut exit,
            &mut kernel,
            &mut user,
        ) != 0
        {
            Some((millis(&user), millis(&kernel)))
        } else {
            None
        }
    }
}

#[cfg(not(any(unix, windows)))]
fn cpu_times() -> Option<(i64, i64)> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_collector() {
        let collector = ProcessCollector::new();
        let metrics = collector.collect();

        assert!(metrics.iter().any(|m| m.name == "reporter.uptime"));
        assert_eq!(collector.name(), "process");
    }

    #[test]
    #[cfg(unix)]
    fn test_cpu_times() {
        let (user, system) = cpu_times().unwrap();
        assert!(user >= 0);
        assert!(system >= 0);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_linux_process_metrics() {
        let metrics = ProcessCollector::new().collect();
        let names: Vec<_> = metrics.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"process.threads.count"));
        assert!(names.contains(&"process.open_fds"));
    }
}
