use crate::models::{Statement, Transaction};
use crate::repository::StatementRepository;
use anyhow::anyhow;
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory repository used by tests and as the fallback when no MongoDB
/// connection is configured. Coarse per-map reader/writer locks; no lock is
/// ever held across I/O.
#[derive(Default)]
pub struct MemoryRepository {
    statements: RwLock<HashMap<String, Statement>>,
    transactions: RwLock<HashMap<String, Transaction>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatementRepository for MemoryRepository {
    async fn get_statement(&self, id: &str) -> Result<Option<Statement>, AppError> {
        let statements = self.statements.read().await;
        Ok(statements.get(id).cloned())
    }

    async fn upsert_statement(&self, statement: &Statement) -> Result<(), AppError> {
        let mut statements = self.statements.write().await;
        statements.insert(statement.id.clone(), statement.clone());
        Ok(())
    }

    async fn get_transactions(&self, statement_id: &str) -> Result<Vec<Transaction>, AppError> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|tx| tx.statement_id == statement_id)
            .cloned()
            .collect())
    }

    async fn upsert_transaction(&self, transaction: &Transaction) -> Result<(), AppError> {
        let mut transactions = self.transactions.write().await;
        transactions.insert(transaction.id.clone(), transaction.clone());
        Ok(())
    }

    async fn delete_transaction(&self, id: &str) -> Result<(), AppError> {
        let mut transactions = self.transactions.write().await;
        match transactions.remove(id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(anyhow!("transaction not found: {id}"))),
        }
    }
}
