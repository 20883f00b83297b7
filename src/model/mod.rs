//! Types that represent the data exchanged with the finance sheet, such as `FinancialSummary` and
//! `TransactionDraft`.
mod amount;
mod summary;
mod transaction;

pub use amount::{Amount, AmountError};
pub use summary::{CategoryAmount, DateRange, FinancialSummary};
pub use transaction::{TransactionDraft, TransactionKind};
