use crate::config::{RepositoryBackend, StatementConfig};
use crate::handlers;
use crate::repository::{MemoryRepository, MongoRepository, StatementRepository};
use crate::services::StatementService;
use axum::{routing::get, Router};
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn StatementRepository>,
    pub service: StatementService,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: StatementConfig) -> Result<Self, AppError> {
        let repository = build_repository(&config).await?;
        Self::build_with_repository(config, repository).await
    }

    /// Wire the router and listener around an already-constructed repository.
    /// Tests use this to inject the in-memory backend directly.
    pub async fn build_with_repository(
        config: StatementConfig,
        repository: Arc<dyn StatementRepository>,
    ) -> Result<Self, AppError> {
        let service = StatementService::new(repository.clone());
        let state = AppState {
            repository,
            service,
        };

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route(
                "/api/statements",
                get(handlers::get_statement).post(handlers::create_statement),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn repository(&self) -> Arc<dyn StatementRepository> {
        self.state.repository.clone()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

/// Select the repository backend once at startup. A configured MongoDB
/// backend that cannot be reached degrades to the in-memory repository with
/// a warning instead of refusing to start.
async fn build_repository(
    config: &StatementConfig,
) -> Result<Arc<dyn StatementRepository>, AppError> {
    match config.repository.backend {
        RepositoryBackend::Memory => {
            tracing::warn!("Using in-memory repository; data will not survive a restart");
            Ok(Arc::new(MemoryRepository::new()))
        }
        RepositoryBackend::Mongodb => {
            match connect_mongo(&config.repository.mongodb_uri, &config.repository.mongodb_database)
                .await
            {
                Ok(repo) => {
                    tracing::info!(
                        database = %config.repository.mongodb_database,
                        "Using MongoDB repository"
                    );
                    Ok(Arc::new(repo))
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to connect to MongoDB, falling back to in-memory repository"
                    );
                    Ok(Arc::new(MemoryRepository::new()))
                }
            }
        }
    }
}

async fn connect_mongo(uri: &str, database: &str) -> Result<MongoRepository, AppError> {
    let repo = MongoRepository::connect(uri, database).await?;
    // The driver connects lazily; ping so an unreachable server is caught now
    repo.health_check().await?;
    repo.initialize_indexes().await?;
    Ok(repo)
}
