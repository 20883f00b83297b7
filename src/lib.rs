//! finsheet-sync: the engine behind a spreadsheet-backed personal finance dashboard.
//!
//! A launch resolves a `Session` from a navigation link or the session store, then a `Dashboard`
//! keeps the month-to-date `FinancialSummary` fresh, accepts new transactions, and derives the
//! category breakdown shown in the chart.

pub mod api;
pub mod args;
pub mod commands;
mod config;
pub mod dashboard;
mod error;
mod fs;
pub mod model;
pub mod session;
pub mod sync;
mod utils;
pub mod view;

pub use api::{Gateway, Mode};
pub use config::Config;
pub use dashboard::{Dashboard, Settings};
pub use error::{Error, Failure, Result};
pub use model::{Amount, FinancialSummary, TransactionDraft, TransactionKind};
pub use session::{Session, User};
