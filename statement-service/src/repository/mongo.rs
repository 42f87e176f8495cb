use crate::models::{Statement, Transaction};
use crate::repository::StatementRepository;
use anyhow::anyhow;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{IndexOptions, UpdateOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use std::future::Future;
use std::time::Duration;

/// Upper bound on any single driver call. Expiry cancels the call and
/// surfaces as a database error; retrying is the caller's concern.
const OP_TIMEOUT: Duration = Duration::from_secs(5);

/// MongoDB repository. Two collections: `statements` keyed by derived
/// statement id, `transactions` keyed by transaction id with a
/// `statement_id` field for the parent range lookup.
#[derive(Clone)]
pub struct MongoRepository {
    client: MongoClient,
    db: Database,
}

impl MongoRepository {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let statement_id_index = IndexModel::builder()
            .keys(doc! { "statement_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("statement_id_lookup".to_string())
                    .build(),
            )
            .build();

        self.transactions()
            .create_index(statement_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create statement_id index on transactions collection: {}",
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!("Created index on transactions.statement_id");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    fn statements(&self) -> Collection<Statement> {
        self.db.collection("statements")
    }

    fn transactions(&self) -> Collection<Transaction> {
        self.db.collection("transactions")
    }
}

/// Run one driver call under the fixed operation timeout, logging failures
/// with the operation name.
async fn bounded<T, F>(operation: &'static str, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, mongodb::error::Error>>,
{
    match tokio::time::timeout(OP_TIMEOUT, call).await {
        Ok(result) => result.map_err(|e| {
            tracing::error!(operation, error = %e, "MongoDB operation failed");
            AppError::from(e)
        }),
        Err(_) => {
            tracing::error!(
                operation,
                timeout_secs = OP_TIMEOUT.as_secs(),
                "MongoDB operation timed out"
            );
            Err(AppError::DatabaseError(anyhow!(
                "{operation} timed out after {}s",
                OP_TIMEOUT.as_secs()
            )))
        }
    }
}

#[async_trait]
impl StatementRepository for MongoRepository {
    async fn get_statement(&self, id: &str) -> Result<Option<Statement>, AppError> {
        bounded(
            "get_statement",
            self.statements().find_one(doc! { "_id": id }, None),
        )
        .await
    }

    async fn upsert_statement(&self, statement: &Statement) -> Result<(), AppError> {
        let mut fields = mongodb::bson::to_document(statement)
            .map_err(|e| AppError::InternalError(anyhow!("failed to serialize statement: {e}")))?;
        // _id is immutable; the filter supplies it on insert
        fields.remove("_id");

        bounded(
            "upsert_statement",
            self.statements().update_one(
                doc! { "_id": &statement.id },
                doc! { "$set": fields },
                UpdateOptions::builder().upsert(true).build(),
            ),
        )
        .await?;
        Ok(())
    }

    async fn get_transactions(&self, statement_id: &str) -> Result<Vec<Transaction>, AppError> {
        bounded("get_transactions", async {
            let mut cursor = self
                .transactions()
                .find(doc! { "statement_id": statement_id }, None)
                .await?;
            let mut transactions = Vec::new();
            while let Some(tx) = cursor.try_next().await? {
                transactions.push(tx);
            }
            Ok(transactions)
        })
        .await
    }

    async fn upsert_transaction(&self, transaction: &Transaction) -> Result<(), AppError> {
        let mut fields = mongodb::bson::to_document(transaction).map_err(|e| {
            AppError::InternalError(anyhow!("failed to serialize transaction: {e}"))
        })?;
        fields.remove("_id");

        bounded(
            "upsert_transaction",
            self.transactions().update_one(
                doc! { "_id": &transaction.id },
                doc! { "$set": fields },
                UpdateOptions::builder().upsert(true).build(),
            ),
        )
        .await?;
        Ok(())
    }

    async fn delete_transaction(&self, id: &str) -> Result<(), AppError> {
        let result = bounded(
            "delete_transaction",
            self.transactions().delete_one(doc! { "_id": id }, None),
        )
        .await?;

        if result.deleted_count == 0 {
            return Err(AppError::NotFound(anyhow!("transaction not found: {id}")));
        }
        Ok(())
    }
}
