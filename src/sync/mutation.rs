//! Sends new transactions to the sheet and asks for a refresh when one is accepted.

use crate::api::Gateway;
use crate::error::Failure;
use crate::model::TransactionDraft;
use crate::session::Session;
use crate::sync::RefreshHandle;
use std::sync::Arc;
use tracing::{debug, info};

/// The write path of the dashboard. There is no optimistic update: the summary only reflects a new
/// transaction once the refresh it triggers has completed.
#[derive(Clone)]
pub struct Mutations {
    session: Option<Session>,
    gateway: Arc<dyn Gateway>,
    refresh: RefreshHandle,
}

impl Mutations {
    pub fn new(
        session: Option<Session>,
        gateway: Arc<dyn Gateway>,
        refresh: RefreshHandle,
    ) -> Self {
        Self {
            session,
            gateway,
            refresh,
        }
    }

    /// Submits `draft`. Returns `true` if the sheet accepted it, in which case one refresh has been
    /// requested (but not awaited). Never retries: a second submission could create a duplicate.
    pub async fn submit(&self, draft: TransactionDraft) -> bool {
        self.try_submit(draft).await.is_ok()
    }

    /// Like `submit`, but reports why a submission did not go through.
    ///
    /// # Errors
    /// - `Failure::MissingSession` without making any remote call if there is no session.
    /// - Whatever the gateway reported otherwise.
    pub async fn try_submit(&self, draft: TransactionDraft) -> Result<(), Failure> {
        let Some(session) = &self.session else {
            debug!("Not submitting a transaction without a session");
            return Err(Failure::MissingSession);
        };
        self.gateway
            .submit_transaction(session.sheet_id(), &draft)
            .await?;
        info!(
            "Added {} {} in {}",
            draft.kind(),
            draft.amount(),
            draft.category()
        );
        self.refresh.request();
        Ok(())
    }
}

impl std::fmt::Debug for Mutations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutations")
            .field("session", &self.session)
            .finish()
    }
}
