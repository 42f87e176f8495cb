use crate::models::{SourceType, Statement, StatementType, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query parameters shared by both methods on `/api/statements`.
#[derive(Debug, Deserialize)]
pub struct StatementParams {
    pub id: Option<String>,
    #[serde(rename = "$expand")]
    pub expand: Option<String>,
}

/// Statement as submitted by the upstream extraction pipeline. The internal
/// id is never client-authoritative and has no field here; missing scalars
/// fall back to zero values and are caught by normalization.
#[derive(Debug, Deserialize)]
pub struct StatementRequest {
    #[serde(rename = "type", default)]
    pub statement_type: StatementType,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub source_name: String,
    pub source_id: Option<String>,
    #[serde(default)]
    pub total_amount: f64,
    pub previous_amount: Option<f64>,
    pub previous_paid: Option<f64>,
    pub previous_unpaid: Option<f64>,
    pub current_amount: Option<f64>,
    #[serde(default)]
    pub currency: String,
    pub payment_due_date: Option<DateTime<Utc>>,
    pub transactions: Option<Vec<TransactionRequest>>,
    pub extra: Option<serde_json::Value>,
}

/// Transaction line item as submitted. `statement_id` and `payment_source`
/// are write-rejected and deliberately have no fields here.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: f64,
    pub date: Option<DateTime<Utc>>,
    pub extra: Option<serde_json::Value>,
}

impl From<StatementRequest> for Statement {
    fn from(req: StatementRequest) -> Self {
        Self {
            id: String::new(),
            statement_type: req.statement_type,
            source_type: req.source_type,
            source_name: req.source_name,
            source_id: req.source_id,
            total_amount: req.total_amount,
            previous_amount: req.previous_amount,
            previous_paid: req.previous_paid,
            previous_unpaid: req.previous_unpaid,
            current_amount: req.current_amount,
            currency: req.currency,
            payment_due_date: req.payment_due_date,
            transactions: req
                .transactions
                .map(|txs| txs.into_iter().map(Transaction::from).collect()),
            extra: req.extra,
        }
    }
}

impl From<TransactionRequest> for Transaction {
    fn from(req: TransactionRequest) -> Self {
        Self {
            id: req.id,
            description: req.description,
            amount: req.amount,
            date: req.date,
            statement_id: String::new(),
            payment_source: None,
            extra: req.extra,
        }
    }
}

/// Statement as served to clients. The internal id travels in the `Location`
/// header on creation rather than in the body.
#[derive(Debug, Serialize)]
pub struct StatementResponse {
    #[serde(rename = "type")]
    pub statement_type: StatementType,
    pub source_type: SourceType,
    pub source_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_paid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_unpaid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_amount: Option<f64>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<TransactionResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub description: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl From<Statement> for StatementResponse {
    fn from(stmt: Statement) -> Self {
        Self {
            statement_type: stmt.statement_type,
            source_type: stmt.source_type,
            source_name: stmt.source_name,
            source_id: stmt.source_id,
            total_amount: stmt.total_amount,
            previous_amount: stmt.previous_amount,
            previous_paid: stmt.previous_paid,
            previous_unpaid: stmt.previous_unpaid,
            current_amount: stmt.current_amount,
            currency: stmt.currency,
            payment_due_date: stmt.payment_due_date,
            transactions: stmt
                .transactions
                .map(|txs| txs.into_iter().map(TransactionResponse::from).collect()),
            extra: stmt.extra,
        }
    }
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            description: tx.description,
            amount: tx.amount,
            date: tx.date,
            extra: tx.extra,
        }
    }
}
