//! Cache Sweeper
//!
//! Background task that periodically walks every key, evicting dead
//! entries and refreshing stale entries that are still being read, so the
//! cost is paid off the read path.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::CacheEngine;
use crate::error::{CacheError, Result};

/// Counts from a single sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries classified during the pass
    pub examined: usize,
    /// Entries removed from the store
    pub evicted: usize,
    /// Stale entries brought back to fresh
    pub refreshed: usize,
    /// Refresh attempts that failed or left the entry stale
    pub refresh_failures: usize,
    /// The pass stopped early because of a stop signal
    pub interrupted: bool,
}

/// Lifecycle of a [`Sweeper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    Stopped,
    Running,
    Stopping,
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner {
    state: SweeperState,
    task: Option<RunningTask>,
}

/// Handle owning the background sweep loop of one [`CacheEngine`].
///
/// The host decides its lifetime through [`start`](Self::start) and
/// [`stop`](Self::stop). Dropping a running sweeper signals it to stop
/// without waiting for it.
pub struct Sweeper<V> {
    engine: Arc<CacheEngine<V>>,
    interval: Duration,
    inner: Mutex<Inner>,
}

impl<V> Sweeper<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a stopped sweeper.
    ///
    /// The pass interval is the engine's touch window, so an entry counts as
    /// untouched exactly when nobody read it since the previous pass.
    pub fn new(engine: Arc<CacheEngine<V>>) -> Self {
        let interval = engine.policy().touch_window();
        Self {
            engine,
            interval,
            inner: Mutex::new(Inner {
                state: SweeperState::Stopped,
                task: None,
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SweeperState {
        self.inner.lock().state
    }

    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// Calling it while already running does nothing. Calling it while a
    /// `stop()` is still waiting for the loop fails with
    /// [`CacheError::Lifecycle`]; start again once `stop()` has returned.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            SweeperState::Stopped => {}
            SweeperState::Running => {
                debug!("Sweeper already started");
                return Ok(());
            }
            SweeperState::Stopping => {
                return Err(CacheError::Lifecycle(
                    "sweeper is stopping; start it again after stop() returns".to_string(),
                ));
            }
        }

        let runtime = Handle::try_current().map_err(|err| {
            CacheError::Lifecycle(format!("sweeper must be started inside a tokio runtime: {err}"))
        })?;

        let cancel = CancellationToken::new();
        let handle = runtime.spawn(run_sweep_loop(
            Arc::clone(&self.engine),
            self.interval,
            cancel.clone(),
        ));

        inner.task = Some(RunningTask { cancel, handle });
        inner.state = SweeperState::Running;
        Ok(())
    }

    /// Signals the loop to stop and waits until it has exited. A pass in
    /// progress finishes the key it is on and stops there.
    pub async fn stop(&self) {
        let task = {
            let mut inner = self.inner.lock();
            match inner.task.take() {
                Some(task) => {
                    inner.state = SweeperState::Stopping;
                    task
                }
                None => return,
            }
        };

        task.cancel.cancel();
        if let Err(err) = task.handle.await {
            warn!(error = %err, "Sweeper task ended abnormally");
        }

        self.inner.lock().state = SweeperState::Stopped;
        info!("Cache sweeper stopped");
    }

    /// Runs a single pass immediately, independent of the loop.
    pub async fn run_once(&self) -> Result<SweepReport> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.sweep(&CancellationToken::new()))
            .await
            .map_err(|err| CacheError::Lifecycle(format!("sweep pass failed: {err}")))
    }
}

impl<V> Drop for Sweeper<V> {
    fn drop(&mut self) {
        if let Some(task) = self.inner.get_mut().task.take() {
            task.cancel.cancel();
        }
    }
}

async fn run_sweep_loop<V>(
    engine: Arc<CacheEngine<V>>,
    interval: Duration,
    cancel: CancellationToken,
) where
    V: Clone + Send + Sync + 'static,
{
    info!(
        interval_ms = interval.as_millis() as u64,
        backend = engine.backend_name(),
        "Starting cache sweeper"
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        // Refresh hooks are synchronous and may block.
        let pass_engine = Arc::clone(&engine);
        let pass_cancel = cancel.clone();
        let pass = tokio::task::spawn_blocking(move || pass_engine.sweep(&pass_cancel)).await;

        match pass {
            Ok(report) if report.evicted > 0 || report.refreshed > 0 => {
                info!(
                    examined = report.examined,
                    evicted = report.evicted,
                    refreshed = report.refreshed,
                    refresh_failures = report.refresh_failures,
                    "Cache sweep completed"
                );
            }
            Ok(report) => {
                debug!(examined = report.examined, "Cache sweep: nothing to do");
            }
            Err(err) => {
                warn!(error = %err, "Cache sweep pass aborted");
            }
        }
    }

    debug!("Cache sweeper loop exited");
}
