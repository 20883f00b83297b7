use crate::model::Amount;
use crate::Result;
use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether money came in or went out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionKind);
serde_plain::derive_fromstr_from_deserialize!(TransactionKind);

/// A transaction that has not been sent yet. It is built by the front end, handed to the mutation
/// gateway once, and then dropped.
///
/// The shape beyond presence checks belongs to the remote script; the client does not validate
/// categories or amounts against anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: Amount,
    category: String,
    #[serde(with = "iso_date")]
    date: NaiveDate,
    #[serde(default)]
    note: String,
}

impl TransactionDraft {
    /// Creates a draft.
    ///
    /// # Errors
    /// - Returns an error if `category` is blank.
    pub fn new(
        kind: TransactionKind,
        amount: Amount,
        category: impl Into<String>,
        date: NaiveDate,
        note: impl Into<String>,
    ) -> Result<Self> {
        let category = category.into();
        ensure!(
            !category.trim().is_empty(),
            "A transaction needs a category"
        );
        Ok(Self {
            kind,
            amount,
            category,
            date,
            note: note.into(),
        })
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}

mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub(super) fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(FORMAT).to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(d)?;
        NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 9).unwrap()
    }

    #[test]
    fn test_blank_category_rejected() {
        let result = TransactionDraft::new(TransactionKind::Expense, 10.into(), "  ", date(), "");
        assert!(result.is_err());
    }

    #[test]
    fn test_wire_shape() {
        let draft = TransactionDraft::new(
            TransactionKind::Expense,
            Amount::from(45_000),
            "Ăn uống",
            date(),
            "phở",
        )
        .unwrap();
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "expense",
                "amount": 45000,
                "category": "Ăn uống",
                "date": "2024-05-09",
                "note": "phở"
            })
        );
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            TransactionKind::from_str("income").unwrap(),
            TransactionKind::Income
        );
        assert!(TransactionKind::from_str("transfer").is_err());
        assert_eq!(TransactionKind::Expense.to_string(), "expense");
    }
}
