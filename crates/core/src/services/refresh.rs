use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::errors::CoreError;
use crate::models::report::RefreshReport;
use crate::models::settings::MIN_REFRESH_INTERVAL_MS;
use crate::services::catalog::Catalog;

/// A catalog shared between user actions and the refresh loop.
///
/// The mutex is the critical section: a refresh tick and a create/update/
/// delete never interleave their load-modify-save sequences.
pub type SharedCatalog = Arc<Mutex<Catalog>>;

/// Lock the catalog and run `f` on the blocking thread pool.
///
/// Catalog mutations rewrite the records file, so they must not run on an
/// executor thread. The lock is held until `f` returns.
pub async fn with_catalog_blocking<T, F>(catalog: &SharedCatalog, f: F) -> Result<T, CoreError>
where
    F: FnOnce(&mut Catalog) -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    let mut guard = Arc::clone(catalog).lock_owned().await;
    tokio::task::spawn_blocking(move || f(&mut guard))
        .await
        .map_err(|e| CoreError::Runtime(format!("Catalog task failed: {e}")))?
}

/// Capacity of the refresh event channel; slow subscribers miss old events.
const EVENT_CAPACITY: usize = 16;

/// Published after every tick, scheduled or on demand.
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    Completed(RefreshReport),
    /// Prices were updated in memory but could not be saved
    Failed(String),
}

/// Periodically re-simulates every price in the catalog and persists it.
///
/// The loop runs as a Tokio task; `start` returns `CoreError::Runtime` when
/// no runtime is available on the calling thread. Dropping the loop stops it.
pub struct RefreshLoop {
    catalog: SharedCatalog,
    record_history: bool,
    events: broadcast::Sender<RefreshEvent>,
    task: Option<RunningTask>,
}

struct RunningTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for RefreshLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshLoop")
            .field("record_history", &self.record_history)
            .field("running", &self.is_running())
            .finish()
    }
}

impl RefreshLoop {
    pub fn new(catalog: SharedCatalog, record_history: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            catalog,
            record_history,
            events,
            task: None,
        }
    }

    /// Receive an event for each tick from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }

    /// Run one refresh immediately and return its outcome.
    pub async fn trigger_once(&self) -> Result<RefreshReport, CoreError> {
        run_tick(&self.catalog, self.record_history, &self.events).await
    }

    /// Start ticking every `interval`, the first tick firing immediately.
    /// A loop that is already running is restarted with the new interval.
    /// Intervals shorter than `MIN_REFRESH_INTERVAL_MS` are raised to it.
    pub fn start(&mut self, interval: Duration) -> Result<(), CoreError> {
        let runtime = Handle::try_current().map_err(|e| {
            CoreError::Runtime(format!("Refresh loop needs a Tokio runtime: {e}"))
        })?;
        self.stop();
        let interval = interval.max(Duration::from_millis(MIN_REFRESH_INTERVAL_MS));

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let catalog = Arc::clone(&self.catalog);
        let events = self.events.clone();
        let record_history = self.record_history;

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Errors are already logged and published.
                        let _ = run_tick(&catalog, record_history, &events).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Refresh loop stopped");
        });

        info!(interval_ms = interval.as_millis() as u64, "Refresh loop started");
        self.task = Some(RunningTask { shutdown, handle });
        Ok(())
    }

    /// Stop scheduling ticks. A tick already in progress completes.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.shutdown.send(true);
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_tick(
    catalog: &SharedCatalog,
    record_history: bool,
    events: &broadcast::Sender<RefreshEvent>,
) -> Result<RefreshReport, CoreError> {
    let outcome =
        with_catalog_blocking(catalog, move |c| c.refresh_prices(record_history)).await;

    // No subscribers is not an error.
    let _ = match &outcome {
        Ok(report) => {
            info!(updated = report.updated, "Prices refreshed");
            events.send(RefreshEvent::Completed(report.clone()))
        }
        Err(e) => {
            error!(error = %e, "Price refresh could not be saved");
            events.send(RefreshEvent::Failed(e.to_string()))
        }
    };

    outcome
}
