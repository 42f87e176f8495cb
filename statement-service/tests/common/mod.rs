use service_core::config::Config as CoreConfig;
use statement_service::config::{RepositoryBackend, RepositoryConfig, StatementConfig};
use statement_service::repository::{MemoryRepository, StatementRepository};
use statement_service::startup::Application;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub repository: Arc<dyn StatementRepository>,
}

impl TestApp {
    /// Spawn the application on a random port backed by the in-memory
    /// repository, and wait until the HTTP server answers.
    pub async fn spawn() -> Self {
        let config = StatementConfig {
            common: CoreConfig { port: 0 },
            repository: RepositoryConfig {
                backend: RepositoryBackend::Memory,
                mongodb_uri: "mongodb://localhost:27017".to_string(),
                mongodb_database: "statement_test".to_string(),
            },
        };

        let repository: Arc<dyn StatementRepository> = Arc::new(MemoryRepository::new());
        let app = Application::build_with_repository(config, repository.clone())
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            repository,
        }
    }
}
