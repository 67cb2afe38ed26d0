use async_trait::async_trait;

use super::error::{DriverError, DriverErrorKind, DriverResult};
use crate::models::{ResultSet, Row, Value};

/// Runs SQL against the analytical store.
///
/// Implementations open a fresh connection for every call and close it
/// before returning, on success and on failure alike. Errors are raw driver
/// failures; repositories translate them.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// All rows, keyed by the statement's result column names in order.
    async fn fetch_all(&self, query: &str, params: &[Value]) -> DriverResult<ResultSet>;

    /// The first row, or `None` when the query returns nothing.
    async fn fetch_one(&self, query: &str, params: &[Value]) -> DriverResult<Option<Row>>;
}

/// Stand-in used when no database is configured.
///
/// Every call fails as a driver interface error, which surfaces to clients
/// as a connection failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredExecutor;

impl UnconfiguredExecutor {
    fn error() -> DriverError {
        DriverError::new(
            DriverErrorKind::Interface,
            "no database configured; set [database] in the configuration file",
        )
    }
}

#[async_trait]
impl QueryExecutor for UnconfiguredExecutor {
    fn backend(&self) -> &'static str {
        "none"
    }

    async fn fetch_all(&self, _query: &str, _params: &[Value]) -> DriverResult<ResultSet> {
        Err(Self::error())
    }

    async fn fetch_one(&self, _query: &str, _params: &[Value]) -> DriverResult<Option<Row>> {
        Err(Self::error())
    }
}

/// Close a connection that has finished its work.
///
/// Close failures are logged and ignored: the query outcome is already known
/// and the socket is released when the connection is dropped either way.
#[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
pub(crate) async fn release<C: sqlx::Connection>(conn: C, backend: &'static str) {
    if let Err(e) = conn.close().await {
        tracing::debug!(backend, error = %e, "Failed to close database connection cleanly");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_executor_fails_as_interface_error() {
        let executor = UnconfiguredExecutor;

        let err = executor.fetch_all("SELECT 1", &[]).await.unwrap_err();
        assert_eq!(err.kind(), DriverErrorKind::Interface);

        let err = executor.fetch_one("SELECT 1", &[]).await.unwrap_err();
        assert_eq!(err.kind(), DriverErrorKind::Interface);
    }
}
