use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::StorageBackend;
use crate::storage::memory::MemStorage;
use crate::storage::postgres::PgStorage;
use crate::storage::Storage;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Builds the configured storage backend. Postgres gets its schema created
/// before the handle is returned.
pub async fn open_storage(backend: &StorageBackend) -> Result<Arc<dyn Storage>> {
    match backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemStorage::new()))
        }
        StorageBackend::Postgres { database_url } => {
            let storage = PgStorage::new(create_pool(database_url).await?);
            storage
                .migrate()
                .await
                .context("Failed to create database schema")?;
            Ok(Arc::new(storage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::NewUser;

    #[tokio::test]
    async fn test_memory_backend_is_usable() {
        let storage = open_storage(&StorageBackend::Memory).await.unwrap();
        let user = storage
            .create_user(NewUser {
                email: "ada@example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(storage.get_user(user.id).await.unwrap().is_some());
    }
}
