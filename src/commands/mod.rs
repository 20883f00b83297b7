//! Command handlers for the finsheet CLI.
//!
//! This module contains implementations for all CLI subcommands. They are the front end of the
//! dashboard engine: they resolve the session, start the engine, and render what it holds.

mod add;
mod connect;
mod summary;
mod watch;

use crate::model::FinancialSummary;
use crate::session::Session;
use crate::view::ChartSlice;
use serde::Serialize;
use std::fmt::{Debug, Write};
use std::time::Duration;
use tokio::sync::watch::Receiver;
use tracing::{debug, info};

pub use add::add;
pub use connect::{connect, show_session};
pub use summary::summary;
pub use watch::watch;

/// What the user sees when no connection information is available.
pub const MISSING_SESSION_HELP: &str = "Missing connection information.\n\n\
    Open the dashboard with the link you were given, which looks like\n\
    https://miniappshare.netlify.app/?api=URL_API&sheetId=ID_SHEET\n\
    by running: finsheet connect '<LINK>'";

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// The session as shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub user: String,
    pub email: String,
    pub endpoint: String,
    pub sheet_id: String,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            user: session.user().name.clone(),
            email: session.user().email.clone(),
            endpoint: session.api_url().to_string(),
            sheet_id: session.sheet_id().to_string(),
        }
    }
}

/// A summary together with its chart breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub sheet_id: String,
    pub summary: FinancialSummary,
    pub chart: Vec<ChartSlice>,
}

/// Renders a summary and its breakdown as text.
pub(crate) fn render(view: &SummaryView) -> String {
    let s = &view.summary;
    let mut out = String::new();
    let _ = writeln!(out, "Sheet {}", view.sheet_id);
    let _ = writeln!(out, "  Income:  {:>16}", s.income.to_string());
    let _ = writeln!(out, "  Expense: {:>16}", s.expense.to_string());
    let _ = writeln!(out, "  Savings: {:>16}", s.savings.to_string());
    let _ = write!(out, "  Balance: {:>16}", s.balance.to_string());

    if view.chart.is_empty() {
        out.push_str("\n  No spending recorded yet");
        return out;
    }
    out.push_str("\n  Spending by category:");
    let total: f64 = view.chart.iter().map(|slice| slice.value).sum();
    for slice in &view.chart {
        let percent = if total == 0.0 {
            0.0
        } else {
            slice.value / total * 100.0
        };
        let _ = write!(
            out,
            "\n    {:<20} {:>16} {:>4.0}%",
            slice.name,
            format_num::format_num!(",.0", slice.value),
            percent
        );
    }
    out
}

/// Waits up to `timeout` for the next summary published on `updates`.
pub(crate) async fn next_summary(
    updates: &mut Receiver<FinancialSummary>,
    timeout: Duration,
) -> Option<FinancialSummary> {
    match tokio::time::timeout(timeout, updates.changed()).await {
        Ok(Ok(())) => Some(updates.borrow_and_update().clone()),
        Ok(Err(_)) => None,
        Err(_) => {
            debug!("No summary within {}s", timeout.as_secs());
            None
        }
    }
}
