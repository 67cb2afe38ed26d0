use std::sync::Arc;

use async_trait::async_trait;

use super::{period_cte, translate};
use crate::{
    db::{
        dates::{DateDefaults, prepare_dates},
        error::{RepoError, RepoResult},
        executor::QueryExecutor,
    },
    models::{DateRangeParams, QueryRecord},
};

/// Profitability defaults to the first day of the month twelve months back.
pub const PROFITABILITY_DATES: DateDefaults =
    DateDefaults::new("CURRENT_DATE - INTERVAL '12 months'", "CURRENT_DATE", 12).start_day(1);

#[async_trait]
pub trait FinancialRepo: Send + Sync {
    /// Invoiced quantity, revenue and margin over the price-list floor per
    /// item and business type, net of credit notes.
    async fn item_profitability(&self, range: &DateRangeParams) -> RepoResult<QueryRecord>;
}

pub struct SqlFinancialRepo {
    executor: Arc<dyn QueryExecutor>,
}

impl SqlFinancialRepo {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl FinancialRepo for SqlFinancialRepo {
    async fn item_profitability(&self, range: &DateRangeParams) -> RepoResult<QueryRecord> {
        translate("item_profitability", async {
            let dates = prepare_dates(range.start(), range.end(), &PROFITABILITY_DATES)?;
            let query = format!(
                "WITH {},
lines AS (
    SELECT
        INV1.ItemCode,
        OITM.ItemName,
        OCRD.U_Tipo_Negocios AS business_type,
        ITM1.Price AS floor_price,
        SUM(INV1.Quantity) AS quantity,
        SUM(ITM1.Price * INV1.Quantity) AS floor_total,
        SUM(INV1.LineTotal + INV1.VatSum) AS billed
    FROM OINV
    INNER JOIN INV1 ON OINV.DocEntry = INV1.DocEntry
    INNER JOIN OITM ON INV1.ItemCode = OITM.ItemCode
    INNER JOIN OCRD ON OCRD.CardCode = OINV.CardCode
    INNER JOIN ITM1 ON ITM1.PriceList = 4 AND OITM.ItemCode = ITM1.ItemCode
    CROSS JOIN period
    WHERE OINV.TaxDate BETWEEN period.start_date AND period.end_date
        AND OINV.CANCELED = 'N'
    GROUP BY INV1.ItemCode, OITM.ItemName, OCRD.U_Tipo_Negocios, ITM1.Price

    UNION ALL

    SELECT
        RIN1.ItemCode,
        OITM.ItemName,
        OCRD.U_Tipo_Negocios,
        ITM1.Price,
        -SUM(RIN1.Quantity),
        -SUM(ITM1.Price * RIN1.Quantity),
        -SUM(RIN1.LineTotal + RIN1.VatSum)
    FROM ORIN
    INNER JOIN RIN1 ON ORIN.DocEntry = RIN1.DocEntry
    INNER JOIN OITM ON RIN1.ItemCode = OITM.ItemCode
    INNER JOIN OCRD ON OCRD.CardCode = ORIN.CardCode
    INNER JOIN ITM1 ON ITM1.PriceList = 4 AND OITM.ItemCode = ITM1.ItemCode
    CROSS JOIN period
    WHERE ORIN.TaxDate BETWEEN period.start_date AND period.end_date
        AND ORIN.CANCELED = 'N'
    GROUP BY RIN1.ItemCode, OITM.ItemName, OCRD.U_Tipo_Negocios, ITM1.Price
)
SELECT
    l.ItemCode AS \"ItemCode\",
    l.ItemName AS \"ItemName\",
    l.business_type AS \"TipoDoNegocio\",
    CAST(SUM(l.quantity) AS NUMERIC(19, 0)) AS \"Quantidade\",
    CAST(l.floor_price AS NUMERIC(19, 2)) AS \"PrecoMinimoUnitario\",
    CAST(SUM(l.billed) AS NUMERIC(19, 2)) AS \"FaturamentoPorItem\",
    CAST(
        (SUM(l.billed) - SUM(l.floor_total)) / NULLIF(SUM(l.floor_total), 0) * 100
        AS NUMERIC(19, 2)
    ) AS \"Rentabilidade\"
FROM lines l
GROUP BY
    l.ItemCode,
    l.ItemName,
    l.business_type,
    l.floor_price
ORDER BY
    l.ItemCode,
    \"TipoDoNegocio\"",
                period_cte(&dates)
            );
            tracing::debug!(report = "item_profitability", %query, "Executing report query");

            let rows = self.executor.fetch_all(&query, &[]).await?;
            Ok::<_, RepoError>(QueryRecord::new(rows, query))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        db::{DriverErrorKind, mock::MockExecutor},
        models::Row,
    };

    #[tokio::test]
    async fn test_item_profitability_returns_rows() {
        let rows = vec![
            Row::new()
                .with("ItemCode", "ITEM001")
                .with("ItemName", "Produto A")
                .with("TipoDoNegocio", "Varejo")
                .with("Quantidade", Decimal::new(10, 0))
                .with("PrecoMinimoUnitario", Decimal::new(1050, 2))
                .with("FaturamentoPorItem", Decimal::new(15000, 2))
                .with("Rentabilidade", Decimal::new(4285, 2)),
        ];
        let mock = MockExecutor::new().with_rows(rows.clone());

        let record = SqlFinancialRepo::new(Arc::new(mock.clone()))
            .item_profitability(&DateRangeParams::new(Some("2024-01-01"), Some("2024-06-30")))
            .await
            .unwrap();

        assert_eq!(record.data, rows);
        assert!(record.query.contains("CAST('2024-01-01' AS DATE) AS start_date"));
        assert!(record.query.contains("CAST('2024-06-30' AS DATE) AS end_date"));
    }

    #[tokio::test]
    async fn test_item_profitability_defaults() {
        let mock = MockExecutor::new();

        let record = SqlFinancialRepo::new(Arc::new(mock.clone()))
            .item_profitability(&DateRangeParams::default())
            .await
            .unwrap();

        assert!(
            record
                .query
                .contains("CAST(CURRENT_DATE - INTERVAL '12 months' AS DATE) AS start_date")
        );
        assert!(record.query.contains("CAST(CURRENT_DATE AS DATE) AS end_date"));
    }

    #[tokio::test]
    async fn test_item_profitability_inverted_range() {
        let mock = MockExecutor::new();

        let err = SqlFinancialRepo::new(Arc::new(mock.clone()))
            .item_profitability(&DateRangeParams::new(Some("2024-06-30"), Some("2024-01-01")))
            .await
            .unwrap_err();

        assert!(matches!(err, RepoError::Query { .. }));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_item_profitability_database_error() {
        let mock = MockExecutor::new().with_error(DriverErrorKind::Database, "deadlock");

        let err = SqlFinancialRepo::new(Arc::new(mock))
            .item_profitability(&DateRangeParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RepoError::Repository { .. }));
        assert_eq!(err.details(), "deadlock");
    }
}
