/// Logs an internal diagnostic message through the `log` crate.
///
/// All messages go to the `wavefront` target so applications can filter the
/// reporter's chatter independently of their own logs.
macro_rules! wavefront_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "wavefront", $($arg)*)
    };
}

/// Like `wavefront_debug!` but at warning level, for failures that are
/// absorbed instead of returned.
macro_rules! wavefront_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "wavefront", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_expand_without_a_logger() {
        wavefront_debug!("debug {}", 1);
        wavefront_warn!("warn {}", 2);
    }
}
