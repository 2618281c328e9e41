use crate::collector::MetricCollector;
use crate::protocol::RuntimeMetric;

/// Collects `runtime.memory.rss`, the resident set size in bytes.
pub struct MemoryCollector {
    _private: (),
}

impl MemoryCollector {
    /// Creates a new memory collector.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for MemoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricCollector for MemoryCollector {
    fn collect(&self) -> Vec<RuntimeMetric> {
        match rss_bytes() {
            Some(rss) => vec![RuntimeMetric::gauge("runtime.memory.rss", rss).with_unit("bytes")],
            None => Vec::new(),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(target_os = "linux")]
fn rss_bytes() -> Option<i64> {
    // /proc/self/statm: size resident shared text lib data dt, in pages
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: i64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as i64;
    if page_size <= 0 {
        return None;
    }
    Some(resident_pages * page_size)
}

#[cfg(target_os = "macos")]
fn rss_bytes() -> Option<i64> {
    let mut info: libc::proc_taskinfo = unsafe { std::mem::zeroed() };
    let size = std::mem::size_of::<libc::proc_taskinfo>() as libc::c_int;
    let written = unsafe {
        libc::proc_pidinfo(
            libc::getpid(),
            libc::PROC_PIDTASKINFO,
            0,
            &mut info as *mut libc::proc_taskinfo as *mut libc::c_void,
            size,
        )
    };
    if written != size {
        return None;
    }
    i64::try_from(info.pti_resident_size).ok()
}

#[cfg(target_os = "windows")]
fn rss_bytes() -> Option<i64> {
    use windows_sys::Win32::System::ProcessStatus::{
        GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS,
    };
    use windows_sys::Win32::System::Threading::GetCurrentProcess;

    let size = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;
    unsafe {
        let mut counters: PROCESS_MEMORY_COUNTERS = std::mem::zeroed();
        counters.cb = size;
        if GetProcessMemoryInfo(GetCurrentProcess(), &mut counters, size) != 0 {
            Some(counters.WorkingSetSize as i64)
        } else {
            None
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn rss_bytes() -> Option<i64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    fn test_memory_collector() {
        let metrics = MemoryCollector::new().collect();
        let rss = metrics
            .iter()
            .find(|m| m.name == "runtime.memory.rss")
            .expect("rss is collected");
        assert!(rss.value.as_f64() > 0.0);
        assert_eq!(rss.unit.as_deref(), Some("bytes"));
    }
}
