//! Keeps the shared `FinancialSummary` fresh.
//!
//! The scheduler is the only writer of the summary. It fetches once when started, then on every
//! tick of a fixed interval and whenever a `RefreshHandle` asks for it. Fetches are not serialized:
//! a timer tick can overlap a requested refresh. Every fetch is stamped when it is issued and a
//! result is only applied if its stamp is newer than the one behind the current snapshot, so a slow
//! older response cannot replace a newer one.

use crate::api::Gateway;
use crate::error::Failure;
use crate::model::{DateRange, FinancialSummary};
use crate::session::Session;
use crate::Result;
use anyhow::bail;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

/// The default time between scheduled refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Lifecycle of a `Scheduler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, not started. No fetches happen.
    Idle,
    /// Started with a session; fetching on the interval and on request.
    Active,
    /// Stopped. No further fetches and late results are discarded.
    Disposed,
}

/// State shared between the scheduler, its loop task, the fetch tasks and refresh handles.
struct Shared {
    gateway: Arc<dyn Gateway>,
    summary: watch::Sender<FinancialSummary>,
    state: Mutex<SchedulerState>,
    disposed: AtomicBool,
    /// Stamp of the most recently issued fetch.
    issued: AtomicU64,
    /// Stamp of the fetch that produced the current summary. Held while publishing.
    applied: Mutex<u64>,
}

impl Shared {
    fn state(&self) -> SchedulerState {
        *lock(&self.state)
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Issues one fetch on its own task.
    fn spawn_fetch(self: &Arc<Self>, sheet_id: &str) {
        let stamp = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::clone(self);
        let sheet_id = sheet_id.to_string();
        trace!("Issuing fetch {stamp}");
        tokio::spawn(async move {
            let result = shared
                .gateway
                .fetch_summary(&sheet_id, DateRange::current_month())
                .await;
            shared.complete(stamp, result);
        });
    }

    /// Applies the result of fetch `stamp` if it is still wanted.
    fn complete(&self, stamp: u64, result: std::result::Result<FinancialSummary, Failure>) {
        if self.is_disposed() {
            debug!("Discarding fetch {stamp}, the scheduler has stopped");
            return;
        }
        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                // The gateway has logged it; the previous snapshot stays.
                debug!("Fetch {stamp} failed, keeping the current summary: {e}");
                return;
            }
        };
        let mut applied = lock(&self.applied);
        if stamp <= *applied {
            debug!("Discarding fetch {stamp}, fetch {} is newer", *applied);
            return;
        }
        *applied = stamp;
        self.summary.send_replace(summary);
        debug!("Applied fetch {stamp}");
    }
}

/// A cloneable capability to ask the scheduler for an immediate refresh.
#[derive(Clone)]
pub struct RefreshHandle {
    shared: Arc<Shared>,
    requests: mpsc::UnboundedSender<()>,
}

impl RefreshHandle {
    /// Requests one out-of-band fetch. Returns `false` if the scheduler is not active, in which
    /// case the request is dropped.
    pub fn request(&self) -> bool {
        if self.shared.state() != SchedulerState::Active {
            debug!("Ignoring refresh request, the scheduler is not active");
            return false;
        }
        self.requests.send(()).is_ok()
    }
}

impl std::fmt::Debug for RefreshHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshHandle")
            .field("state", &self.shared.state())
            .finish()
    }
}

/// Owns the refresh loop. See the module documentation.
pub struct Scheduler {
    shared: Arc<Shared>,
    interval: Duration,
    requests: mpsc::UnboundedSender<()>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Creates an idle scheduler that will fetch through `gateway` every `interval` once started.
    ///
    /// # Panics
    /// - If `interval` is zero.
    pub fn new(gateway: Arc<dyn Gateway>, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "The refresh interval must be non-zero");
        let (summary, _) = watch::channel(FinancialSummary::default());
        let (requests, receiver) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                gateway,
                summary,
                state: Mutex::new(SchedulerState::Idle),
                disposed: AtomicBool::new(false),
                issued: AtomicU64::new(0),
                applied: Mutex::new(0),
            }),
            interval,
            requests,
            receiver: Mutex::new(Some(receiver)),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.shared.state()
    }

    /// Moves from `Idle` to `Active`: fetches immediately and then every interval. Must be called
    /// from within a tokio runtime.
    ///
    /// # Errors
    /// - Returns an error if the scheduler has already been started or stopped.
    pub fn start(&self, session: Session) -> Result<()> {
        let mut state = lock(&self.shared.state);
        if *state != SchedulerState::Idle {
            bail!("The scheduler cannot be started from the {:?} state", *state);
        }
        let Some(receiver) = lock(&self.receiver).take() else {
            bail!("The scheduler has already been started");
        };
        *state = SchedulerState::Active;
        drop(state);

        info!(
            "Refreshing sheet {} every {}s",
            session.sheet_id(),
            self.interval.as_secs()
        );
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(run(shared, session, self.interval, receiver));
        *lock(&self.task) = Some(handle);
        Ok(())
    }

    /// Moves to `Disposed`: cancels the timer and discards any fetch that is still in flight.
    /// Calling it again, or on an idle scheduler, is harmless.
    pub fn stop(&self) {
        self.shared.disposed.store(true, Ordering::SeqCst);
        let previous = std::mem::replace(&mut *lock(&self.shared.state), SchedulerState::Disposed);
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
        if previous == SchedulerState::Active {
            info!("Stopped refreshing");
        }
    }

    /// A handle other components use to ask for a refresh.
    pub fn refresh_handle(&self) -> RefreshHandle {
        RefreshHandle {
            shared: Arc::clone(&self.shared),
            requests: self.requests.clone(),
        }
    }

    /// Requests one out-of-band fetch. See `RefreshHandle::request`.
    pub fn refresh(&self) -> bool {
        self.refresh_handle().request()
    }

    /// A clone of the current summary.
    pub fn summary(&self) -> FinancialSummary {
        self.shared.summary.borrow().clone()
    }

    /// Subscribes to summary replacements.
    pub fn subscribe(&self) -> watch::Receiver<FinancialSummary> {
        self.shared.summary.subscribe()
    }

    /// The stamp of the most recently issued fetch, 0 before the first one.
    pub fn last_issued(&self) -> u64 {
        self.shared.issued.load(Ordering::SeqCst)
    }

    /// The stamp of the fetch behind the current summary, 0 before one has been applied. A summary
    /// read after this call is at least as new as the returned stamp.
    pub fn last_applied(&self) -> u64 {
        *lock(&self.shared.applied)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state())
            .field("interval", &self.interval)
            .finish()
    }
}

/// The refresh loop. The first tick of a tokio interval completes immediately, which gives the
/// fetch on activation.
async fn run(
    shared: Arc<Shared>,
    session: Session,
    interval: Duration,
    mut requests: mpsc::UnboundedReceiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => trace!("Scheduled refresh"),
            request = requests.recv() => match request {
                Some(()) => trace!("Requested refresh"),
                None => break,
            },
        }
        if shared.is_disposed() {
            break;
        }
        shared.spawn_fetch(session.sheet_id());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Nothing panics while holding these locks, recover the data if something ever does.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
