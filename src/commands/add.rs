use crate::api::Mode;
use crate::args::AddArgs;
use crate::commands::summary::{open, wait};
use crate::commands::{render, Out, SummaryView};
use crate::dashboard::Dashboard;
use crate::model::{FinancialSummary, TransactionDraft};
use crate::{Config, Result};
use anyhow::Context;
use chrono::Local;
use std::time::Duration;
use tokio::sync::watch::Receiver;
use tracing::{debug, warn};

/// Submits one transaction and prints the summary that the resulting refresh brings back.
///
/// # Errors
/// - When there is no connection.
/// - When the draft is invalid or the sheet does not confirm the insert.
pub async fn add(config: Config, args: AddArgs, mode: Mode) -> Result<Out<SummaryView>> {
    let draft = TransactionDraft::new(
        args.kind(),
        args.amount(),
        args.category(),
        args.date().unwrap_or_else(|| Local::now().date_naive()),
        args.note(),
    )?;

    let dashboard = open(&config, args.link().link(), mode)?;
    submit_and_refresh(dashboard, draft, wait(&config)).await
}

/// Submits `draft` without waiting for the fetch issued on start, then waits up to `wait` for a
/// summary from a fetch issued after the submission.
async fn submit_and_refresh(
    mut dashboard: Dashboard,
    draft: TransactionDraft,
    wait: Duration,
) -> Result<Out<SummaryView>> {
    let mut updates = dashboard.subscribe();
    let before = dashboard.last_issued_fetch();

    let submitted = dashboard.mutations().try_submit(draft.clone()).await;
    if let Err(e) = submitted {
        dashboard.close();
        return Err(e).with_context(|| {
            format!(
                "Unable to add the {} of {} in '{}'",
                draft.kind(),
                draft.amount(),
                draft.category()
            )
        });
    }

    let refreshed = tokio::time::timeout(wait, newer_than(&dashboard, &mut updates, before)).await;
    let summary = match refreshed {
        Ok(Some(summary)) => summary,
        _ => {
            warn!("The transaction was added but the summary could not be refreshed");
            dashboard.summary()
        }
    };
    let view = SummaryView {
        sheet_id: dashboard.session().sheet_id().to_string(),
        chart: dashboard.chart(&summary),
        summary,
    };
    dashboard.close();
    let message = format!(
        "Added the {} of {} in '{}'\n{}",
        draft.kind(),
        draft.amount(),
        draft.category(),
        render(&view)
    );
    Ok(Out::new(message, view))
}

/// The first summary published from a fetch stamped after `stamp`. Older ones are skipped.
async fn newer_than(
    dashboard: &Dashboard,
    updates: &mut Receiver<FinancialSummary>,
    stamp: u64,
) -> Option<FinancialSummary> {
    loop {
        updates.changed().await.ok()?;
        let applied = dashboard.last_applied_fetch();
        let summary = updates.borrow_and_update().clone();
        if applied > stamp {
            return Some(summary);
        }
        debug!("Skipping the summary from fetch {applied}, it predates the submission");
    }
}
