//! A named background thread that runs a task at a fixed rate.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::utils::unpoison;

// Guards against a zero interval turning the worker into a busy loop.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Runs a task periodically on its own thread until shut down.
///
/// Shutdown is cooperative: a task that is already running finishes before
/// the thread exits.
pub(crate) struct PeriodicWorker {
    name: String,
    shutdown: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicWorker {
    /// Spawns the worker.  The task first runs after `delay`, then every
    /// `interval`.  A delay or interval too large to schedule means the task
    /// never runs again.
    ///
    /// Returns `None` if the thread could not be spawned.
    pub(crate) fn spawn<F>(
        name: &str,
        delay: Duration,
        interval: Duration,
        mut task: F,
    ) -> Option<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        #[allow(clippy::mutex_atomic)]
        let shutdown = Arc::new((Mutex::new(false), Condvar::new()));

        let worker_shutdown = shutdown.clone();
        let worker_name = name.to_owned();
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let (lock, cvar) = worker_shutdown.as_ref();
                // `None` once the schedule runs past what an `Instant` can hold
                let mut next_run = Instant::now().checked_add(delay);
                let mut stopped = unpoison(lock.lock());
                loop {
                    // check this first, in case shutdown was requested before we got here
                    if *stopped {
                        return;
                    }
                    let Some(run_at) = next_run else {
                        stopped = unpoison(cvar.wait(stopped));
                        continue;
                    };
                    let timeout = run_at
                        .checked_duration_since(Instant::now())
                        .unwrap_or_default();
                    if !timeout.is_zero() {
                        stopped = unpoison(cvar.wait_timeout(stopped, timeout)).0;
                        continue;
                    }
                    drop(stopped);

                    if panic::catch_unwind(AssertUnwindSafe(&mut task)).is_err() {
                        wavefront_warn!("[{}] periodic task panicked", worker_name);
                    }

                    let now = Instant::now();
                    next_run = match run_at.checked_add(interval) {
                        Some(next) if next >= now => Some(next),
                        _ => now.checked_add(interval),
                    };
                    stopped = unpoison(lock.lock());
                }
            });

        match handle {
            Ok(handle) => Some(Self {
                name: name.to_owned(),
                shutdown,
                handle: Some(handle),
            }),
            Err(err) => {
                wavefront_warn!("failed to spawn {} thread: {}", name, err);
                None
            }
        }
    }

    /// Signals the thread to stop and waits for it to exit.
    ///
    /// Calling this more than once is a no-op.
    pub(crate) fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let (lock, cvar) = self.shutdown.as_ref();
        *unpoison(lock.lock()) = true;
        cvar.notify_all();

        // a task that calls back into its owner's teardown would deadlock on join
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            wavefront_warn!("[{}] worker thread panicked", self.name);
        }
        wavefront_debug!("[{}] worker stopped", self.name);
    }
}

impl Drop for PeriodicWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
