//! Implements the `Gateway` trait using in-memory data.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a finance sheet behind it.

use crate::api::Gateway;
use crate::error::Failure;
use crate::model::{
    Amount, CategoryAmount, DateRange, FinancialSummary, TransactionDraft, TransactionKind,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::trace;

/// A scripted answer for the next `fetch_summary` call.
#[derive(Debug, Clone)]
struct Scripted {
    delay: Option<Duration>,
    result: Result<FinancialSummary, Failure>,
}

/// How many of the most recent fetches are remembered for inspection.
const RECENT_FETCHES: usize = 64;

#[derive(Debug, Default)]
struct State {
    summary: FinancialSummary,
    scripted: VecDeque<Scripted>,
    fail_submissions: bool,
    fetch_count: usize,
    submit_count: usize,
    recent_fetches: VecDeque<(String, DateRange)>,
}

/// An in-memory `Gateway`. Clones share the same state, so a test can keep one clone to inspect
/// calls while the engine owns another.
///
/// Without scripted answers, fetches return the current summary, and accepted submissions are
/// folded into that summary the way the sheet would total them.
#[derive(Debug, Clone, Default)]
pub struct TestGateway {
    state: Arc<Mutex<State>>,
}

impl TestGateway {
    /// A gateway whose fetches return `summary` until it is changed.
    pub fn new(summary: FinancialSummary) -> Self {
        let gateway = Self::default();
        gateway.lock().summary = summary;
        gateway
    }

    /// A gateway seeded with a month of sample data.
    pub fn seeded() -> Self {
        Self::new(seed_summary())
    }

    /// Queues `result` as the answer to the next fetch, ahead of the default behavior.
    pub fn push_fetch(&self, result: Result<FinancialSummary, Failure>) {
        self.push_fetch_delayed(Duration::ZERO, result);
    }

    /// Queues `result` as the answer to the next fetch, delivered after `delay`.
    pub fn push_fetch_delayed(&self, delay: Duration, result: Result<FinancialSummary, Failure>) {
        let delay = (!delay.is_zero()).then_some(delay);
        self.lock().scripted.push_back(Scripted { delay, result });
    }

    /// Makes every following submission fail (or succeed again).
    pub fn fail_submissions(&self, fail: bool) {
        self.lock().fail_submissions = fail;
    }

    pub fn set_summary(&self, summary: FinancialSummary) {
        self.lock().summary = summary;
    }

    /// The number of `fetch_summary` calls made so far.
    pub fn fetch_count(&self) -> usize {
        self.lock().fetch_count
    }

    /// The sheet id and range of the most recent fetches, oldest first. At most 64 are kept.
    pub fn fetches(&self) -> Vec<(String, DateRange)> {
        self.lock().recent_fetches.iter().cloned().collect()
    }

    /// The number of `submit_transaction` calls made so far, accepted or not.
    pub fn submit_count(&self) -> usize {
        self.lock().submit_count
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock only happens in a failing test.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl Gateway for TestGateway {
    async fn fetch_summary(
        &self,
        sheet_id: &str,
        range: DateRange,
    ) -> Result<FinancialSummary, Failure> {
        let scripted = {
            let mut state = self.lock();
            state.fetch_count += 1;
            if state.recent_fetches.len() == RECENT_FETCHES {
                state.recent_fetches.pop_front();
            }
            state.recent_fetches.push_back((sheet_id.to_string(), range));
            state.scripted.pop_front()
        };
        match scripted {
            Some(Scripted { delay, result }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(self.lock().summary.clone()),
        }
    }

    async fn submit_transaction(
        &self,
        sheet_id: &str,
        draft: &TransactionDraft,
    ) -> Result<(), Failure> {
        let mut state = self.lock();
        state.submit_count += 1;
        trace!("Test submission to {sheet_id}");
        if state.fail_submissions {
            return Err(Failure::Application("submissions are disabled".into()));
        }
        apply(&mut state.summary, draft);
        Ok(())
    }
}

/// Folds `draft` into `summary`.
fn apply(summary: &mut FinancialSummary, draft: &TransactionDraft) {
    let amount = draft.amount().value();
    match draft.kind() {
        TransactionKind::Income => {
            summary.income = Amount::new(summary.income.value() + amount);
            summary.balance = Amount::new(summary.balance.value() + amount);
        }
        TransactionKind::Expense => {
            summary.expense = Amount::new(summary.expense.value() + amount);
            summary.balance = Amount::new(summary.balance.value() - amount);
            match summary
                .expense_categories
                .iter_mut()
                .find(|c| c.category == draft.category())
            {
                Some(existing) => existing.amount = Amount::new(existing.amount.value() + amount),
                None => summary
                    .expense_categories
                    .push(CategoryAmount::new(draft.category(), draft.amount())),
            }
        }
    }
}

/// Seed data for the in-memory gateway.
fn seed_summary() -> FinancialSummary {
    FinancialSummary {
        income: Amount::from(18_500_000),
        expense: Amount::from(7_342_000),
        savings: Amount::from(3_000_000),
        balance: Amount::from(8_158_000),
        expense_categories: vec![
            CategoryAmount::new("Ăn uống", 3_120_000),
            CategoryAmount::new("Đi lại", 860_000),
            CategoryAmount::new("Nhà cửa", 2_500_000),
            CategoryAmount::new("Giải trí", 612_000),
            CategoryAmount::new("Sức khỏe", 250_000),
        ],
    }
}
