//! The remote side of the dashboard: a spreadsheet script reachable at a single endpoint.
//!
//! `Gateway` is the seam. `HttpGateway` talks to the real script and `TestGateway` keeps
//! everything in memory so the program can run top-to-bottom without a backend.

mod http;
mod test_gateway;

pub use http::HttpGateway;
pub use test_gateway::TestGateway;

use crate::error::Failure;
use crate::model::{DateRange, FinancialSummary, TransactionDraft};
use crate::session::Session;
use crate::{Config, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// The `action` value selecting the summary query.
pub const GET_FINANCIAL_SUMMARY: &str = "getFinancialSummary";

/// The `action` value selecting a transaction insert.
pub const ADD_TRANSACTION: &str = "addTransaction";

/// The environment variable that, when non-empty, switches to the in-memory gateway.
pub const TEST_MODE_ENV: &str = "FINSHEET_IN_TEST_MODE";

/// The two operations the remote script supports. Both are stateless. Neither is idempotent from
/// the gateway's point of view: submitting the same draft twice may create two rows.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// Fetches the aggregated summary for `range` from the sheet `sheet_id`.
    async fn fetch_summary(
        &self,
        sheet_id: &str,
        range: DateRange,
    ) -> std::result::Result<FinancialSummary, Failure>;

    /// Appends `draft` to the sheet `sheet_id`. `Ok` only when the remote side confirms it.
    async fn submit_transaction(
        &self,
        sheet_id: &str,
        draft: &TransactionDraft,
    ) -> std::result::Result<(), Failure>;
}

/// Whether we are talking to the real script or to in-memory data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Remote,
    Test,
}

impl Mode {
    /// `Mode::Test` when `FINSHEET_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Remote`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(v) if !v.is_empty() => Mode::Test,
            _ => Mode::Remote,
        }
    }
}

/// Creates the gateway for `session`.
pub fn gateway(session: &Session, config: &Config, mode: Mode) -> Result<Arc<dyn Gateway>> {
    match mode {
        Mode::Remote => {
            let gateway = HttpGateway::new(session.endpoint().clone(), config.request_timeout())?;
            Ok(Arc::new(gateway))
        }
        Mode::Test => {
            debug!("Using the in-memory gateway");
            Ok(Arc::new(TestGateway::seeded()))
        }
    }
}

/// JavaScript-style truthiness, which is how the script's `success` and `error` fields are meant
/// to be read.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("Sheet not found")));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_mode_default() {
        assert_eq!(Mode::default(), Mode::Remote);
    }
}
