//! The context object a front end holds for the lifetime of one launch.
//!
//! It is built once from the resolved session and owns the scheduler, the write path and the
//! category view. Front ends read state from it and call its operations; nothing here is global.

use crate::api::{self, Gateway, Mode};
use crate::error::Failure;
use crate::model::{FinancialSummary, TransactionDraft};
use crate::session::{self, Session, SessionStore};
use crate::sync::{Mutations, RefreshHandle, Scheduler};
use crate::view::{CategoryView, ChartSlice};
use crate::{Config, Result};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// Timing knobs for a `Dashboard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub refresh_interval: Duration,
    pub empty_retry_delay: Duration,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            empty_retry_delay: config.empty_retry_delay(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval: crate::sync::DEFAULT_REFRESH_INTERVAL,
            empty_retry_delay: crate::view::DEFAULT_EMPTY_RETRY_DELAY,
        }
    }
}

/// A running dashboard engine. Dropping it, or calling `close`, stops all refreshing.
#[derive(Debug)]
pub struct Dashboard {
    session: Session,
    scheduler: Scheduler,
    /// Subscribed before the scheduler starts and never marked as seen.
    updates: watch::Receiver<FinancialSummary>,
    mutations: Mutations,
    view: CategoryView,
}

impl Dashboard {
    /// Starts the engine for `session`, fetching immediately. Must be called from within a tokio
    /// runtime.
    ///
    /// # Errors
    /// - An error carrying `Failure::MissingSession` if `session` is `None`. Nothing is started in
    ///   that case.
    /// - An error if the scheduler refuses to start.
    pub fn open(
        session: Option<Session>,
        gateway: Arc<dyn Gateway>,
        settings: Settings,
    ) -> Result<Self> {
        let session = session.ok_or(Failure::MissingSession)?;
        let scheduler = Scheduler::new(Arc::clone(&gateway), settings.refresh_interval);
        let mutations = Mutations::new(Some(session.clone()), gateway, scheduler.refresh_handle());
        let view = CategoryView::new(scheduler.refresh_handle(), settings.empty_retry_delay);
        let updates = scheduler.subscribe();
        scheduler
            .start(session.clone())
            .context("Unable to start refreshing the summary")?;
        Ok(Self {
            session,
            scheduler,
            updates,
            mutations,
            view,
        })
    }

    /// Resolves the session from `link` and the configured store, then opens the dashboard with the
    /// gateway for `mode`.
    ///
    /// Returns `Ok(None)` when there is no usable connection information; the front end should
    /// show its instructions instead.
    pub fn launch(config: &Config, link: Option<&Url>, mode: Mode) -> Result<Option<Self>> {
        let store = config.session_store();
        Self::launch_with(config, link, &store, mode)
    }

    /// Like `launch`, with an explicit session store.
    pub fn launch_with(
        config: &Config,
        link: Option<&Url>,
        store: &dyn SessionStore,
        mode: Mode,
    ) -> Result<Option<Self>> {
        let Some(session) = session::resolve(link, store, &config.default_user())? else {
            return Ok(None);
        };
        let gateway = api::gateway(&session, config, mode)?;
        let dashboard = Self::open(Some(session), gateway, Settings::from_config(config))?;
        Ok(Some(dashboard))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The latest applied summary, or the zero summary before the first successful fetch.
    pub fn summary(&self) -> FinancialSummary {
        self.scheduler.summary()
    }

    /// Subscribes to summary replacements. A new receiver reports the latest summary as unseen if
    /// any fetch has been applied since the dashboard opened, so the first fetch is never missed.
    pub fn subscribe(&self) -> watch::Receiver<FinancialSummary> {
        self.updates.clone()
    }

    /// See `Scheduler::last_issued`.
    pub fn last_issued_fetch(&self) -> u64 {
        self.scheduler.last_issued()
    }

    /// See `Scheduler::last_applied`.
    pub fn last_applied_fetch(&self) -> u64 {
        self.scheduler.last_applied()
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        self.scheduler.refresh_handle()
    }

    /// Requests an immediate refresh.
    pub fn refresh(&self) -> bool {
        self.scheduler.refresh()
    }

    /// Submits a transaction. See `Mutations::submit`.
    pub async fn submit(&self, draft: TransactionDraft) -> bool {
        self.mutations.submit(draft).await
    }

    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }

    /// The chart slices for `summary`, scheduling a delayed refresh if it has no categories.
    pub fn chart(&mut self, summary: &FinancialSummary) -> Vec<ChartSlice> {
        self.view.observe(summary)
    }

    /// Stops refreshing.
    pub fn close(self) {
        self.scheduler.stop();
    }
}
