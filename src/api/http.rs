//! Implements the `Gateway` trait over HTTP using `reqwest`.

use crate::api::{is_truthy, Gateway, ADD_TRANSACTION, GET_FINANCIAL_SUMMARY};
use crate::error::Failure;
use crate::model::{DateRange, FinancialSummary, TransactionDraft};
use crate::Result;
use anyhow::Context;
use serde_json::Value;
use std::time::Duration;
use tracing::{trace, warn};
use url::Url;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Talks to the finance sheet's script endpoint. Summaries are read with `GET` and query
/// parameters, transactions are written with a JSON `POST`.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpGateway {
    /// Creates a gateway for `endpoint` whose requests give up after `timeout`.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self::with_client(endpoint, client))
    }

    pub fn with_client(endpoint: Url, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends `request` and returns the decoded JSON body, mapping anything short of a 2xx JSON
    /// response to `Failure::Transport`.
    async fn send(&self, request: reqwest::RequestBuilder) -> std::result::Result<Value, Failure> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Failure::Transport(format!(
                "the endpoint answered with status {status}: {body}"
            )));
        }
        let value: Value = response.json().await?;
        trace!("Response body: {value}");
        Ok(value)
    }
}

#[async_trait::async_trait]
impl Gateway for HttpGateway {
    async fn fetch_summary(
        &self,
        sheet_id: &str,
        range: DateRange,
    ) -> std::result::Result<FinancialSummary, Failure> {
        let start = range.start().format(DATE_FORMAT).to_string();
        let end = range.end().format(DATE_FORMAT).to_string();
        trace!("fetch_summary for {sheet_id} from {start} to {end}");
        let request = self.client.get(self.endpoint.clone()).query(&[
            ("action", GET_FINANCIAL_SUMMARY),
            ("sheetId", sheet_id),
            ("startDate", start.as_str()),
            ("endDate", end.as_str()),
        ]);

        let result = match self.send(request).await {
            Ok(value) => summary_from_response(value),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!("Unable to fetch the financial summary: {e}");
        }
        result
    }

    async fn submit_transaction(
        &self,
        sheet_id: &str,
        draft: &TransactionDraft,
    ) -> std::result::Result<(), Failure> {
        trace!("submit_transaction for {sheet_id}");
        let body = submission_body(sheet_id, draft)?;
        let request = self.client.post(self.endpoint.clone()).json(&body);

        let result = match self.send(request).await {
            Ok(value) => submission_from_response(&value),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!("Unable to add the transaction: {e}");
        }
        result
    }
}

/// Interprets a summary response. An `error` field means the script failed even though the
/// transport succeeded.
fn summary_from_response(value: Value) -> std::result::Result<FinancialSummary, Failure> {
    if value.is_null() {
        return Err(Failure::Application("the response body is empty".into()));
    }
    if let Some(error) = value.get("error").filter(|e| is_truthy(e)) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(Failure::Application(message));
    }
    serde_json::from_value(value)
        .map_err(|e| Failure::Transport(format!("unable to decode the summary: {e}")))
}

/// Interprets a submission response. Only an explicit, truthy `success` counts.
fn submission_from_response(value: &Value) -> std::result::Result<(), Failure> {
    match value.get("success") {
        Some(success) if is_truthy(success) => Ok(()),
        _ => {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("no success indicator in {value}"));
            Err(Failure::Application(message))
        }
    }
}

/// The draft's fields with `action` and `sheetId` laid over them.
fn submission_body(
    sheet_id: &str,
    draft: &TransactionDraft,
) -> std::result::Result<Value, Failure> {
    let mut body = serde_json::to_value(draft)
        .map_err(|e| Failure::Transport(format!("unable to encode the transaction: {e}")))?;
    if let Value::Object(map) = &mut body {
        map.insert("action".into(), Value::String(ADD_TRANSACTION.into()));
        map.insert("sheetId".into(), Value::String(sheet_id.into()));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, CategoryAmount, TransactionKind};
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    /// What the endpoint received.
    #[derive(Debug, Default)]
    struct Received {
        query: Option<HashMap<String, String>>,
        body: Option<Value>,
    }

    #[derive(Clone)]
    struct Endpoint {
        status: StatusCode,
        reply: Value,
        received: Arc<Mutex<Received>>,
    }

    async fn on_get(
        State(endpoint): State<Endpoint>,
        Query(query): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        endpoint.received.lock().unwrap().query = Some(query);
        (endpoint.status, Json(endpoint.reply))
    }

    async fn on_post(
        State(endpoint): State<Endpoint>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        endpoint.received.lock().unwrap().body = Some(body);
        (endpoint.status, Json(endpoint.reply))
    }

    /// Serves a script endpoint at `/exec` on a loopback port that answers every request with
    /// `status` and `reply`.
    async fn serve(status: StatusCode, reply: Value) -> (Url, Arc<Mutex<Received>>) {
        let received = Arc::new(Mutex::new(Received::default()));
        let endpoint = Endpoint {
            status,
            reply,
            received: Arc::clone(&received),
        };
        let app = Router::new()
            .route("/exec", get(on_get).post(on_post))
            .with_state(endpoint);

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let url = Url::parse(&format!("http://{addr}/exec")).unwrap();
        (url, received)
    }

    fn gateway(url: Url) -> HttpGateway {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpGateway::with_client(url, client)
    }

    fn range() -> DateRange {
        DateRange::month_to_date(NaiveDate::from_ymd_opt(2024, 3, 17).unwrap())
    }

    fn draft() -> TransactionDraft {
        TransactionDraft::new(
            TransactionKind::Expense,
            Amount::from(45_000),
            "Food",
            NaiveDate::from_ymd_opt(2024, 3, 17).unwrap(),
            "lunch",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_summary_request_and_decode() {
        let (url, received) = serve(
            StatusCode::OK,
            json!({
                "income": 1000,
                "expense": 400,
                "savings": 100,
                "balance": 500,
                "expenseCategories": [
                    {"category": "Food", "amount": 300},
                    {"category": "Bus", "amount": 100}
                ]
            }),
        )
        .await;
        let summary = gateway(url).fetch_summary("SHEET1", range()).await.unwrap();

        let query = received.lock().unwrap().query.clone().unwrap();
        let expected: HashMap<String, String> = [
            ("action", "getFinancialSummary"),
            ("sheetId", "SHEET1"),
            ("startDate", "2024-03-01"),
            ("endDate", "2024-03-17"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(query, expected);
        assert!(received.lock().unwrap().body.is_none());

        assert_eq!(summary.income, Amount::from(1000));
        assert_eq!(summary.balance, Amount::from(500));
        assert_eq!(
            summary.expense_categories,
            vec![
                CategoryAmount::new("Food", 300),
                CategoryAmount::new("Bus", 100)
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_summary_error_field() {
        let (url, _) = serve(StatusCode::OK, json!({"error": "Sheet not found"})).await;
        let result = gateway(url).fetch_summary("SHEET1", range()).await;
        assert_eq!(
            result,
            Err(Failure::Application("Sheet not found".to_string()))
        );
    }

    #[tokio::test]
    async fn test_fetch_summary_bad_status() {
        let (url, received) = serve(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;
        let result = gateway(url).fetch_summary("SHEET1", range()).await;
        assert!(matches!(result, Err(Failure::Transport(_))));
        assert!(received.lock().unwrap().query.is_some());
    }

    #[tokio::test]
    async fn test_fetch_summary_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = Url::parse(&format!("http://{addr}/exec")).unwrap();
        let result = gateway(url).fetch_summary("SHEET1", range()).await;
        assert!(matches!(result, Err(Failure::Transport(_))));
    }

    #[tokio::test]
    async fn test_submit_transaction_body() {
        let (url, received) = serve(StatusCode::OK, json!({"success": true})).await;
        gateway(url)
            .submit_transaction("SHEET1", &draft())
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert!(received.query.is_none());
        assert_eq!(
            received.body,
            Some(json!({
                "type": "expense",
                "amount": 45000,
                "category": "Food",
                "date": "2024-03-17",
                "note": "lunch",
                "action": "addTransaction",
                "sheetId": "SHEET1"
            }))
        );
    }

    #[tokio::test]
    async fn test_submit_transaction_without_success() {
        let (url, received) = serve(StatusCode::OK, json!({"message": "ok"})).await;
        let result = gateway(url).submit_transaction("SHEET1", &draft()).await;
        assert!(matches!(result, Err(Failure::Application(_))));
        assert!(received.lock().unwrap().body.is_some());
    }

    #[test]
    fn test_summary_from_response_null() {
        assert!(summary_from_response(Value::Null).is_err());
    }

    #[test]
    fn test_submission_from_response_false() {
        let result = submission_from_response(&json!({"success": false, "error": "locked"}));
        assert_eq!(result, Err(Failure::Application("locked".to_string())));
    }
}
