use std::sync::Arc;

use async_trait::async_trait;

use super::{translate, window_clause};
use crate::{
    db::{
        error::{DriverError, DriverErrorKind, RepoResult},
        executor::QueryExecutor,
    },
    models::QueryRecord,
};

/// Freight reports.
#[async_trait]
pub trait LogisticsRepo: Send + Sync {
    /// Invoices per carrier per month over the last six whole months, one row
    /// per carrier and month (`CardCode`, `CardName`, `Total`, `Mes`, `Ano`).
    ///
    /// The row window applies to these long-format rows.
    async fn most_used_carriers(
        &self,
        offset: i64,
        fetch_next: Option<i64>,
    ) -> RepoResult<QueryRecord>;

    /// Distinct carriers over the same six-month window.
    async fn count_carriers(&self) -> RepoResult<QueryRecord<i64>>;
}

pub struct SqlLogisticsRepo {
    executor: Arc<dyn QueryExecutor>,
}

impl SqlLogisticsRepo {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }
}

const CARRIER_FROM: &str = "\
FROM
    OINV T0
INNER JOIN
    INV12 T1 ON T0.DocEntry = T1.DocEntry
INNER JOIN
    OCRD T2 ON T1.Carrier = T2.CardCode
WHERE
    T0.DocDate >= DATE_TRUNC('month', CURRENT_DATE) - INTERVAL '6 months'";

#[async_trait]
impl LogisticsRepo for SqlLogisticsRepo {
    async fn most_used_carriers(
        &self,
        offset: i64,
        fetch_next: Option<i64>,
    ) -> RepoResult<QueryRecord> {
        translate("most_used_carriers", async {
            let query = format!(
                "SELECT
    T2.CardCode AS \"CardCode\",
    T2.CardName AS \"CardName\",
    COUNT(T0.DocEntry) AS \"Total\",
    CAST(EXTRACT(MONTH FROM T0.DocDate) AS INTEGER) AS \"Mes\",
    CAST(EXTRACT(YEAR FROM T0.DocDate) AS INTEGER) AS \"Ano\"
{CARRIER_FROM}
GROUP BY
    T2.CardCode,
    T2.CardName,
    EXTRACT(MONTH FROM T0.DocDate),
    EXTRACT(YEAR FROM T0.DocDate)
ORDER BY
    \"CardName\", \"Mes\", \"Ano\"
{}",
                window_clause(offset, fetch_next)
            );
            tracing::debug!(report = "most_used_carriers", %query, "Executing report query");

            let rows = self.executor.fetch_all(&query, &[]).await?;
            Ok::<_, DriverError>(QueryRecord::new(rows, query))
        })
        .await
    }

    async fn count_carriers(&self) -> RepoResult<QueryRecord<i64>> {
        translate("count_carriers", async {
            let query = format!(
                "SELECT
    COUNT(DISTINCT T2.CardCode) AS \"Total\"
{CARRIER_FROM}"
            );
            tracing::debug!(report = "count_carriers", %query, "Executing report query");

            let total = match self.executor.fetch_one(&query, &[]).await? {
                Some(row) => row.get("Total").and_then(|v| v.as_i64()).ok_or_else(|| {
                    DriverError::new(
                        DriverErrorKind::Data,
                        "count_carriers returned a row without an integer \"Total\"",
                    )
                })?,
                None => 0,
            };
            Ok::<_, DriverError>(QueryRecord::new(total, query))
        })
        .await
    }
}
