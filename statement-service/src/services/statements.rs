use crate::models::{Statement, Transaction};
use crate::repository::StatementRepository;
use anyhow::anyhow;
use service_core::error::AppError;
use std::collections::HashSet;
use std::sync::Arc;

/// Orchestrates normalization, persistence, and transaction reconciliation
/// over the selected repository backend.
#[derive(Clone)]
pub struct StatementService {
    repository: Arc<dyn StatementRepository>,
}

impl StatementService {
    pub fn new(repository: Arc<dyn StatementRepository>) -> Self {
        Self { repository }
    }

    /// Normalize the statement in place and upsert it. Repeated saves of the
    /// same source are idempotent as long as the caller supplies a source_id.
    pub async fn save_statement(&self, statement: &mut Statement) -> Result<(), AppError> {
        statement.normalize()?;
        self.repository.upsert_statement(statement).await
    }

    /// Reconcile the persisted transactions of a statement against an
    /// incoming set: every incoming transaction is normalized and upserted in
    /// caller order, then every persisted transaction missing from the
    /// incoming set is deleted.
    ///
    /// Not atomic: the first failing write aborts and leaves prior mutations
    /// applied. Callers recover by re-ingesting, not by assuming rollback.
    /// Duplicate incoming ids collapse to the last occurrence.
    pub async fn sync_transactions(
        &self,
        statement_id: &str,
        mut incoming: Vec<Transaction>,
    ) -> Result<(), AppError> {
        let persisted = self.repository.get_transactions(statement_id).await?;

        let mut kept = HashSet::with_capacity(incoming.len());
        for (index, tx) in incoming.iter_mut().enumerate() {
            tx.normalize(statement_id).map_err(|e| {
                AppError::ValidationError(anyhow!("invalid transaction at index {index}: {e}"))
            })?;
            self.repository.upsert_transaction(tx).await?;
            kept.insert(tx.id.clone());
        }

        let mut deleted = 0usize;
        for tx in &persisted {
            if !kept.contains(&tx.id) {
                self.repository.delete_transaction(&tx.id).await?;
                deleted += 1;
            }
        }

        tracing::debug!(
            statement_id,
            upserted = kept.len(),
            deleted,
            "Transactions reconciled"
        );
        Ok(())
    }
}
