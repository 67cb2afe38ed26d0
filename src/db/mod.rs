pub mod dates;
mod error;
mod executor;
#[cfg(test)]
pub mod mock;
#[cfg(feature = "database-postgres")]
pub mod postgres;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

use std::sync::Arc;

pub use error::{
    BoxError, DriverError, DriverErrorKind, DriverResult, RepoError, RepoResult,
    classify_database_error,
};
pub use executor::{QueryExecutor, UnconfiguredExecutor};
pub use repos::*;

use crate::config::DatabaseConfig;

/// Repository trait objects, created once at startup.
struct CachedRepos {
    logistics: Arc<dyn LogisticsRepo>,
    inventory: Arc<dyn InventoryRepo>,
    financial: Arc<dyn FinancialRepo>,
    dashboard: Arc<dyn DashboardRepo>,
}

/// Handle on the analytical store: one executor shared by every report
/// repository.
pub struct Database {
    executor: Arc<dyn QueryExecutor>,
    repos: CachedRepos,
}

impl Database {
    pub fn from_executor(executor: Arc<dyn QueryExecutor>) -> Self {
        let repos = CachedRepos {
            logistics: Arc::new(SqlLogisticsRepo::new(executor.clone())),
            inventory: Arc::new(SqlInventoryRepo::new(executor.clone())),
            financial: Arc::new(SqlFinancialRepo::new(executor.clone())),
            dashboard: Arc::new(SqlDashboardRepo::new(executor.clone())),
        };
        Self { executor, repos }
    }

    /// Build the executor for the configured backend.
    ///
    /// No connection is opened here; each query connects on its own.
    pub fn from_config(config: &DatabaseConfig) -> DriverResult<Self> {
        let executor: Arc<dyn QueryExecutor> = match config {
            DatabaseConfig::None => {
                tracing::warn!("No database configured; report endpoints will fail");
                Arc::new(UnconfiguredExecutor)
            }
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => Arc::new(sqlite::SqliteExecutor::new(cfg)?),
            #[cfg(feature = "database-postgres")]
            DatabaseConfig::Postgres(cfg) => Arc::new(postgres::PostgresExecutor::new(cfg)?),
            #[allow(unreachable_patterns)]
            _ => {
                return Err(DriverError::new(
                    DriverErrorKind::Interface,
                    format!(
                        "database backend '{}' is not compiled into this build",
                        config.backend_name()
                    ),
                ));
            }
        };

        tracing::info!(backend = executor.backend(), "Database executor ready");
        Ok(Self::from_executor(executor))
    }

    pub fn backend(&self) -> &'static str {
        self.executor.backend()
    }

    /// Round-trip a trivial statement.
    pub async fn health_check(&self) -> DriverResult<()> {
        self.executor.fetch_one("SELECT 1", &[]).await?;
        Ok(())
    }

    pub fn logistics(&self) -> Arc<dyn LogisticsRepo> {
        self.repos.logistics.clone()
    }

    pub fn inventory(&self) -> Arc<dyn InventoryRepo> {
        self.repos.inventory.clone()
    }

    pub fn financial(&self) -> Arc<dyn FinancialRepo> {
        self.repos.financial.clone()
    }

    pub fn dashboard(&self) -> Arc<dyn DashboardRepo> {
        self.repos.dashboard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockExecutor;

    #[tokio::test]
    async fn test_unconfigured_database_fails_health_check() {
        let db = Database::from_config(&DatabaseConfig::None).unwrap();
        assert_eq!(db.backend(), "none");

        let err = db.health_check().await.unwrap_err();
        assert_eq!(err.kind(), DriverErrorKind::Interface);
    }

    #[tokio::test]
    async fn test_health_check_runs_select_one() {
        let mock = MockExecutor::new();
        let db = Database::from_executor(Arc::new(mock.clone()));

        db.health_check().await.unwrap();

        assert_eq!(mock.last_query().as_deref(), Some("SELECT 1"));
    }

    #[cfg(feature = "database-sqlite")]
    #[tokio::test]
    async fn test_sqlite_database_from_config() {
        let config = DatabaseConfig::Sqlite(crate::config::SqliteConfig {
            path: ":memory:".into(),
            create_if_missing: false,
            busy_timeout_ms: 1000,
        });
        let db = Database::from_config(&config).unwrap();

        assert_eq!(db.backend(), "sqlite");
        db.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_repos_share_the_executor() {
        let mock = MockExecutor::new();
        let db = Database::from_executor(Arc::new(mock.clone()));

        db.logistics().count_carriers().await.unwrap();
        db.dashboard().invoices(None).await.unwrap();

        assert_eq!(mock.call_count(), 2);
    }
}
