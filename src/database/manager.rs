use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Statements applied at startup when schema sync is enabled
const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection pool setup and schema bootstrap
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    /// Create missing tables; existing tables are left untouched
    pub async fn sync_schema(pool: &PgPool) -> Result<(), DatabaseError> {
        let statements = Self::schema_statements();
        for statement in &statements {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Schema sync applied {} statements", statements.len());
        Ok(())
    }

    fn schema_statements() -> Vec<&'static str> {
        SCHEMA_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.lines().all(|l| l.trim().is_empty() || l.trim().starts_with("--")))
            .collect()
    }

    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    pub async fn close(pool: PgPool) {
        pool.close().await;
        info!("Closed database pool");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ALL;

    #[test]
    fn schema_creates_every_resource_table() {
        let statements = DatabaseManager::schema_statements();
        for resource in ALL {
            let needle = format!("CREATE TABLE IF NOT EXISTS \"{}\"", resource.table);
            assert!(
                statements.iter().any(|s| s.contains(&needle)),
                "missing table {}",
                resource.table
            );
        }
    }

    #[test]
    fn schema_declares_every_resource_column() {
        for resource in ALL {
            for column in resource.columns {
                assert!(
                    SCHEMA_SQL.contains(&format!("\"{}\"", column.name)),
                    "missing column {}.{}",
                    resource.table,
                    column.name
                );
            }
        }
    }

    #[tokio::test]
    async fn connect_requires_url() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
            connection_timeout: 1,
            sync_schema: false,
        };
        assert!(matches!(
            DatabaseManager::connect(&config).await,
            Err(DatabaseError::ConfigMissing("DATABASE_URL"))
        ));
    }
}
