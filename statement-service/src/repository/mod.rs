use crate::models::{Statement, Transaction};
use async_trait::async_trait;
use service_core::error::AppError;

pub mod memory;
pub mod mongo;

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;

/// Storage capability set over statements and transactions. One variant is
/// selected at startup and shared behind `Arc<dyn StatementRepository>`.
#[async_trait]
pub trait StatementRepository: Send + Sync {
    /// Fetch a statement by id; `Ok(None)` when no document matches.
    async fn get_statement(&self, id: &str) -> Result<Option<Statement>, AppError>;

    /// Insert-or-replace a statement keyed by its id.
    async fn upsert_statement(&self, statement: &Statement) -> Result<(), AppError>;

    /// All transactions carrying the given statement back-reference.
    async fn get_transactions(&self, statement_id: &str) -> Result<Vec<Transaction>, AppError>;

    /// Insert-or-replace a transaction keyed by its id.
    async fn upsert_transaction(&self, transaction: &Transaction) -> Result<(), AppError>;

    /// Delete a transaction by id. Deleting an absent id is
    /// `AppError::NotFound`, not a no-op.
    async fn delete_transaction(&self, id: &str) -> Result<(), AppError>;
}
