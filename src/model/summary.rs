use crate::model::Amount;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// The aggregated snapshot the remote side computes for a date range. The client never edits one;
/// it is replaced wholesale when a fetch succeeds.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    #[serde(default)]
    pub income: Amount,
    #[serde(default)]
    pub expense: Amount,
    #[serde(default)]
    pub savings: Amount,
    #[serde(default)]
    pub balance: Amount,
    #[serde(default)]
    pub expense_categories: Vec<CategoryAmount>,
}

impl FinancialSummary {
    pub fn expense_categories(&self) -> &[CategoryAmount] {
        &self.expense_categories
    }
}

/// One spending bucket and its total for the period. Names are whatever the sheet uses and are not
/// required to be unique.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub category: String,
    #[serde(default)]
    pub amount: Amount,
}

impl CategoryAmount {
    pub fn new(category: impl Into<String>, amount: impl Into<Amount>) -> Self {
        Self {
            category: category.into(),
            amount: amount.into(),
        }
    }
}

/// An inclusive range of calendar days sent with a summary request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The first day of `today`'s month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        Self { start, end: today }
    }

    /// Month-to-date using the local wall clock.
    pub fn current_month() -> Self {
        Self::month_to_date(chrono::Local::now().date_naive())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_to_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        let range = DateRange::month_to_date(today);
        assert_eq!(range.start(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(range.end(), today);
    }

    #[test]
    fn test_month_to_date_on_first_day() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let range = DateRange::month_to_date(today);
        assert_eq!(range.start(), today);
        assert_eq!(range.end(), today);
    }

    #[test]
    fn test_summary_deserialize() {
        let json = r#"{
            "income": 15000000,
            "expense": "4,250,000",
            "savings": 2000000,
            "balance": 8750000,
            "expenseCategories": [
                {"category": "Ăn uống", "amount": 2500000},
                {"category": "Đi lại", "amount": 1750000}
            ]
        }"#;
        let summary: FinancialSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.income, Amount::from(15_000_000));
        assert_eq!(summary.expense, Amount::from(4_250_000));
        assert_eq!(summary.expense_categories().len(), 2);
        assert_eq!(summary.expense_categories()[1].category, "Đi lại");
    }

    #[test]
    fn test_summary_deserialize_missing_fields() {
        let summary: FinancialSummary = serde_json::from_str(r#"{"income": 10}"#).unwrap();
        assert_eq!(summary.income, Amount::from(10));
        assert!(summary.balance.is_zero());
        assert!(summary.expense_categories().is_empty());
    }
}
