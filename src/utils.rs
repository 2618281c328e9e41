use crate::error::HostResolutionError;

/// Returns the name of the local host.
pub fn resolve_local_hostname() -> Result<String, HostResolutionError> {
    hostname::get()?
        .into_string()
        .map_err(|_| HostResolutionError::InvalidName)
}

/// Returns the guard of a lock even if another thread panicked holding it.
pub(crate) fn unpoison<T>(result: std::sync::LockResult<T>) -> T {
    result.unwrap_or_else(std::sync::PoisonError::into_inner)
}
