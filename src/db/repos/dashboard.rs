use std::sync::Arc;

use async_trait::async_trait;

use super::translate;
use crate::{
    db::{
        error::{DriverError, RepoResult},
        executor::QueryExecutor,
    },
    models::{QueryRecord, Value},
};

#[async_trait]
pub trait DashboardRepo: Send + Sync {
    /// Daily invoice and item counts for open invoices, optionally limited to
    /// one calendar year.
    async fn invoices(&self, year: Option<i32>) -> RepoResult<QueryRecord>;
}

pub struct SqlDashboardRepo {
    executor: Arc<dyn QueryExecutor>,
}

impl SqlDashboardRepo {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl DashboardRepo for SqlDashboardRepo {
    async fn invoices(&self, year: Option<i32>) -> RepoResult<QueryRecord> {
        translate("invoices", async {
            let mut params = Vec::new();
            let mut filter = String::new();
            if let Some(year) = year {
                filter.push_str("\n    AND EXTRACT(YEAR FROM OINV.DocDate) = $1");
                params.push(Value::from(year));
            }

            let query = format!(
                "SELECT
    COUNT(DISTINCT OINV.Serial) AS \"quantidade_notas\",
    CAST(SUM(INV1.Quantity) AS INTEGER) AS \"quantidade_itens\",
    OINV.DocDate AS \"data_emissao\",
    CAST(EXTRACT(MONTH FROM OINV.DocDate) AS INTEGER) AS \"mes_emissao\",
    CAST(EXTRACT(WEEK FROM OINV.DocDate) AS INTEGER) AS \"semana_emissao\",
    CAST(EXTRACT(YEAR FROM OINV.DocDate) AS INTEGER) AS \"ano_emissao\"
FROM OINV
INNER JOIN INV1 ON OINV.DocEntry = INV1.DocEntry
WHERE
    OINV.CANCELED = 'N'
    AND OINV.InvntSttus = 'O'{filter}
GROUP BY
    OINV.DocDate
ORDER BY
    OINV.DocDate"
            );
            tracing::debug!(report = "invoices", %query, params = params.len(), "Executing report query");

            let rows = self.executor.fetch_all(&query, &params).await?;
            Ok::<_, DriverError>(QueryRecord::new(rows, query))
        })
        .await
    }
}
