use anyhow::anyhow;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

/// Integer-coded statement kind, kept lossless for values this service does
/// not know about yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum StatementType {
    CreditCardBill,
    Other(i32),
}

impl Default for StatementType {
    fn default() -> Self {
        Self::Other(0)
    }
}

impl From<i32> for StatementType {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::CreditCardBill,
            other => Self::Other(other),
        }
    }
}

impl From<StatementType> for i32 {
    fn from(value: StatementType) -> Self {
        match value {
            StatementType::CreditCardBill => 1,
            StatementType::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum SourceType {
    CreditCard,
    Other(i32),
}

impl Default for SourceType {
    fn default() -> Self {
        Self::Other(0)
    }
}

impl From<i32> for SourceType {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::CreditCard,
            other => Self::Other(other),
        }
    }
}

impl From<SourceType> for i32 {
    fn from(value: SourceType) -> Self {
        match value {
            SourceType::CreditCard => 1,
            SourceType::Other(other) => other,
        }
    }
}

/// A financial billing record originating from one source.
///
/// Persisted as one document in the `statements` collection, keyed by the
/// derived id. The embedded `transactions` are a snapshot of the statement as
/// ingested; the `transactions` collection is the reconciled source of truth
/// when expansion is requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "type")]
    pub statement_type: StatementType,
    pub source_type: SourceType,
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_paid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_unpaid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_amount: Option<f64>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl Statement {
    /// Validate the statement, derive its id when absent, and normalize the
    /// nested transactions. Mutates in place; performs no I/O.
    ///
    /// When no transactions were supplied, exactly one synthetic transaction
    /// is created covering the total amount, so every valid statement owns at
    /// least one transaction and re-ingesting an unchanged source reproduces
    /// the same synthetic line item.
    pub fn normalize(&mut self) -> Result<(), AppError> {
        if self.source_name.is_empty() {
            return Err(AppError::ValidationError(anyhow!(
                "invalid statement: source_name is required"
            )));
        }
        if self.total_amount <= 0.0 {
            return Err(AppError::ValidationError(anyhow!(
                "invalid statement: total_amount must be positive"
            )));
        }
        if self.currency.is_empty() {
            return Err(AppError::ValidationError(anyhow!(
                "invalid statement: currency is required"
            )));
        }

        self.derive_id();

        let statement_id = self.id.clone();
        let transactions = self.transactions.get_or_insert_with(Vec::new);
        for (index, tx) in transactions.iter_mut().enumerate() {
            tx.normalize(&statement_id).map_err(|e| {
                AppError::ValidationError(anyhow!("invalid transaction at index {index}: {e}"))
            })?;
        }

        if transactions.is_empty() {
            transactions.push(Transaction {
                id: statement_id.clone(),
                description: "Total Amount".to_string(),
                amount: self.total_amount,
                date: self.payment_due_date,
                statement_id,
                payment_source: None,
                extra: None,
            });
        }

        Ok(())
    }

    /// Derive a stable id when none was supplied, in strict priority order:
    /// natural key from the source, then billing period, then a random token.
    fn derive_id(&mut self) {
        if !self.id.is_empty() {
            return;
        }

        self.id = match (&self.source_id, &self.payment_due_date) {
            (Some(source_id), _) => format!("{}_{}", self.source_name, source_id),
            (None, Some(due_date)) => format!(
                "{}_{}",
                self.source_name,
                due_date.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            (None, None) => format!("{}_{}", self.source_name, Uuid::new_v4()),
        };
    }
}

/// A single line item belonging to a statement.
///
/// Persisted as one document in the `transactions` collection, keyed by its
/// id and carrying the parent statement id for the range lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub statement_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_source: Option<PaymentSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl Transaction {
    /// Assign the owning statement id and strip write-rejected fields. The
    /// back-reference is never client-authoritative.
    pub fn normalize(&mut self, statement_id: &str) -> Result<(), AppError> {
        self.statement_id = statement_id.to_string();
        self.payment_source = None;
        Ok(())
    }
}

/// Settlement details attached by downstream payment tracking. Write-rejected
/// on ingestion: normalization strips it so client input never persists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub transaction_id: String,
    pub statement_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn statement() -> Statement {
        Statement {
            id: String::new(),
            statement_type: StatementType::CreditCardBill,
            source_type: SourceType::CreditCard,
            source_name: "bank".to_string(),
            source_id: None,
            total_amount: 100.0,
            previous_amount: None,
            previous_paid: None,
            previous_unpaid: None,
            current_amount: None,
            currency: "USD".to_string(),
            payment_due_date: None,
            transactions: None,
            extra: None,
        }
    }

    #[test]
    fn normalize_synthesizes_single_transaction_for_empty_statement() {
        let mut stmt = statement();
        stmt.normalize().expect("statement should be valid");

        let transactions = stmt.transactions.as_ref().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].id, stmt.id);
        assert_eq!(transactions[0].statement_id, stmt.id);
        assert_eq!(transactions[0].description, "Total Amount");
        assert_eq!(transactions[0].amount, 100.0);
        assert_eq!(transactions[0].date, None);
    }

    #[test]
    fn normalize_is_deterministic_for_same_source_id() {
        let mut first = statement();
        first.source_id = Some("2024-05".to_string());
        let mut second = statement();
        second.source_id = Some("2024-05".to_string());

        first.normalize().unwrap();
        second.normalize().unwrap();

        assert_eq!(first.id, "bank_2024-05");
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn source_id_takes_priority_over_due_date() {
        let mut stmt = statement();
        stmt.source_id = Some("stmt-7".to_string());
        stmt.payment_due_date = Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        stmt.normalize().unwrap();

        assert_eq!(stmt.id, "bank_stmt-7");
    }

    #[test]
    fn due_date_derivation_uses_rfc3339_utc() {
        let mut stmt = statement();
        stmt.payment_due_date = Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        stmt.normalize().unwrap();

        assert_eq!(stmt.id, "bank_2024-05-01T00:00:00Z");
    }

    #[test]
    fn random_fallback_ids_are_unique_but_prefixed() {
        let mut first = statement();
        let mut second = statement();

        first.normalize().unwrap();
        second.normalize().unwrap();

        assert!(first.id.starts_with("bank_"));
        assert!(second.id.starts_with("bank_"));
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn supplied_id_is_never_overwritten() {
        let mut stmt = statement();
        stmt.id = "external-id".to_string();
        stmt.source_id = Some("ignored".to_string());

        stmt.normalize().unwrap();

        assert_eq!(stmt.id, "external-id");
    }

    #[test]
    fn normalize_rejects_missing_required_fields() {
        let mut no_source = statement();
        no_source.source_name = String::new();
        assert!(no_source.normalize().is_err());

        let mut zero_amount = statement();
        zero_amount.total_amount = 0.0;
        assert!(zero_amount.normalize().is_err());

        let mut negative_amount = statement();
        negative_amount.total_amount = -12.5;
        assert!(negative_amount.normalize().is_err());

        let mut no_currency = statement();
        no_currency.currency = String::new();
        assert!(no_currency.normalize().is_err());
    }

    #[test]
    fn normalize_assigns_back_reference_and_strips_payment_source() {
        let mut stmt = statement();
        stmt.source_id = Some("s1".to_string());
        stmt.transactions = Some(vec![Transaction {
            id: "t1".to_string(),
            description: "Groceries".to_string(),
            amount: 42.0,
            date: None,
            statement_id: "spoofed".to_string(),
            payment_source: Some(PaymentSource {
                source_type: "card".to_string(),
                transaction_id: "t1".to_string(),
                statement_id: "spoofed".to_string(),
            }),
            extra: None,
        }]);

        stmt.normalize().unwrap();

        let tx = &stmt.transactions.as_ref().unwrap()[0];
        assert_eq!(tx.statement_id, "bank_s1");
        assert!(tx.payment_source.is_none());
        // supplied transactions suppress the synthetic one
        assert_eq!(stmt.transactions.as_ref().unwrap().len(), 1);
    }
}
