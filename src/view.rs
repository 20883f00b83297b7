//! Turns the summary's category totals into chart-ready slices.

use crate::model::FinancialSummary;
use crate::sync::RefreshHandle;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// The default wait before nudging the scheduler when the summary has no categories yet.
pub const DEFAULT_EMPTY_RETRY_DELAY: Duration = Duration::from_secs(5);

/// One slice of the spending breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub name: String,
    pub value: f64,
}

impl ChartSlice {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Maps each non-zero category total to a slice, keeping the summary's order and names.
pub fn derive(summary: &FinancialSummary) -> Vec<ChartSlice> {
    summary
        .expense_categories()
        .iter()
        .filter(|c| !c.amount.is_zero())
        .map(|c| ChartSlice::new(c.category.clone(), c.amount.to_f64()))
        .collect()
}

/// Derives slices for the front end, and asks for one delayed refresh when a summary arrives with
/// no categories, which is what the sheet returns while it is still warming up.
///
/// Each empty observation schedules a single nudge. A later observation, or dropping the view,
/// cancels a nudge that has not fired yet.
#[derive(Debug)]
pub struct CategoryView {
    refresh: RefreshHandle,
    retry_delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl CategoryView {
    pub fn new(refresh: RefreshHandle, retry_delay: Duration) -> Self {
        Self {
            refresh,
            retry_delay,
            pending: None,
        }
    }

    /// Derives the slices for `summary`. Must be called from within a tokio runtime.
    pub fn observe(&mut self, summary: &FinancialSummary) -> Vec<ChartSlice> {
        self.cancel_pending();
        if summary.expense_categories().is_empty() {
            let refresh = self.refresh.clone();
            let delay = self.retry_delay;
            debug!("No categories yet, refreshing again in {}s", delay.as_secs());
            self.pending = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                refresh.request();
            }));
        }
        derive(summary)
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for CategoryView {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestGateway;
    use crate::model::CategoryAmount;
    use crate::session::{Session, User};
    use crate::sync::Scheduler;
    use std::sync::Arc;

    fn summary(categories: &[(&str, i64)]) -> FinancialSummary {
        FinancialSummary {
            expense_categories: categories
                .iter()
                .map(|(name, amount)| CategoryAmount::new(*name, *amount))
                .collect(),
            ..Default::default()
        }
    }

    fn session() -> Session {
        Session::parse(
            User::new("Quản trị viên", "admin@miniapp.com"),
            "https://example.org/api",
            "SHEET1",
        )
        .unwrap()
    }

    #[test]
    fn test_derive_empty() {
        assert!(derive(&FinancialSummary::default()).is_empty());
    }

    #[test]
    fn test_derive_keeps_order_and_names() {
        let slices = derive(&summary(&[("A", 10), ("B", 20)]));
        assert_eq!(
            slices,
            vec![ChartSlice::new("A", 10.0), ChartSlice::new("B", 20.0)]
        );
    }

    #[test]
    fn test_derive_skips_zero_and_keeps_duplicates() {
        let slices = derive(&summary(&[("Food", 5), ("Gifts", 0), ("Food", 7)]));
        assert_eq!(
            slices,
            vec![ChartSlice::new("Food", 5.0), ChartSlice::new("Food", 7.0)]
        );
    }

    async fn started(gateway: &TestGateway) -> Scheduler {
        let scheduler = Scheduler::new(Arc::new(gateway.clone()), Duration::from_secs(300));
        scheduler.start(session()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        scheduler
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_summary_nudges_once() {
        let gateway = TestGateway::new(FinancialSummary::default());
        let scheduler = started(&gateway).await;
        assert_eq!(gateway.fetch_count(), 1);

        let mut view = CategoryView::new(scheduler.refresh_handle(), DEFAULT_EMPTY_RETRY_DELAY);
        assert!(view.observe(&scheduler.summary()).is_empty());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(gateway.fetch_count(), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(gateway.fetch_count(), 2);

        // One nudge per observation, not a retry loop.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(gateway.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_empty_summary_does_not_nudge() {
        let gateway = TestGateway::new(summary(&[("Food", 5)]));
        let scheduler = started(&gateway).await;
        let mut view = CategoryView::new(scheduler.refresh_handle(), DEFAULT_EMPTY_RETRY_DELAY);
        let slices = view.observe(&scheduler.summary());
        assert_eq!(slices, vec![ChartSlice::new("Food", 5.0)]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(gateway.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_observation_cancels_nudge() {
        let gateway = TestGateway::new(FinancialSummary::default());
        let scheduler = started(&gateway).await;
        let mut view = CategoryView::new(scheduler.refresh_handle(), DEFAULT_EMPTY_RETRY_DELAY);
        view.observe(&FinancialSummary::default());
        tokio::time::sleep(Duration::from_secs(2)).await;
        view.observe(&summary(&[("Food", 5)]));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(gateway.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_view_cancels_nudge() {
        let gateway = TestGateway::new(FinancialSummary::default());
        let scheduler = started(&gateway).await;
        let mut view = CategoryView::new(scheduler.refresh_handle(), DEFAULT_EMPTY_RETRY_DELAY);
        view.observe(&FinancialSummary::default());
        drop(view);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(gateway.fetch_count(), 1);
    }
}
