use std::sync::Arc;

use async_trait::async_trait;

use super::{period_cte, translate};
use crate::{
    db::{
        dates::{DateDefaults, prepare_dates},
        error::{DriverError, RepoError, RepoResult},
        executor::QueryExecutor,
    },
    models::{DateRangeParams, QueryRecord},
};

/// Sales orders default to the first day of the month six months back.
pub const SALES_ORDER_DATES: DateDefaults = DateDefaults::new(
    "DATE_TRUNC('month', CURRENT_DATE) - INTERVAL '6 months'",
    "CURRENT_DATE",
    6,
)
.start_day(1);

/// Product outflow defaults to exactly six months back.
pub const PRODUCT_OUTFLOW_DATES: DateDefaults =
    DateDefaults::new("CURRENT_DATE - INTERVAL '6 months'", "CURRENT_DATE", 6);

/// Stock and purchasing reports.
#[async_trait]
pub trait InventoryRepo: Send + Sync {
    /// Order and sales hit counters per item.
    async fn stock_hits(&self) -> RepoResult<QueryRecord>;

    /// Open purchase order quantity per item and ship month, next twelve months.
    async fn in_transit_orders(&self) -> RepoResult<QueryRecord>;

    /// Invoiced quantity per item, supplier and month.
    async fn sales_orders(&self, range: &DateRangeParams) -> RepoResult<QueryRecord>;

    /// Outgoing quantity per item and supplier per month, invoices plus deliveries.
    async fn product_outflow(&self, range: &DateRangeParams) -> RepoResult<QueryRecord>;
}

pub struct SqlInventoryRepo {
    executor: Arc<dyn QueryExecutor>,
}

impl SqlInventoryRepo {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }
}

const STOCK_HITS_SQL: &str = "\
WITH bounds AS (
    SELECT
        CURRENT_DATE AS today,
        CAST(DATE_TRUNC('month', CURRENT_DATE) - INTERVAL '12 months' AS DATE) AS start_12m,
        CAST(DATE_TRUNC('month', CURRENT_DATE) - INTERVAL '5 months' AS DATE) AS start_6m,
        CURRENT_DATE - 30 AS start_30d
),
orders AS (
    SELECT
        RDR1.ItemCode,
        OITM.ItemName,
        OITM.CardCode,
        ORDR.DocEntry,
        ORDR.DocDate,
        TO_CHAR(ORDR.DocDate, 'YYYY-MM') AS year_month
    FROM ORDR
    INNER JOIN RDR1 ON ORDR.DocEntry = RDR1.DocEntry
    INNER JOIN OITM ON OITM.ItemCode = RDR1.ItemCode
    CROSS JOIN bounds
    WHERE
        ORDR.DocDate BETWEEN bounds.start_12m AND bounds.today
        AND ORDR.CANCELED = 'N'
)
SELECT
    o.ItemCode AS \"ItemCode\",
    o.ItemName AS \"ItemName\",
    COALESCE(o.CardCode, '') AS \"CardCode\",
    COUNT(o.DocEntry) AS \"Hits12Months\",
    COUNT(CASE WHEN o.DocDate BETWEEN b.start_30d AND b.today THEN o.DocEntry END) AS \"Hits30Days\",
    COUNT(DISTINCT CASE WHEN o.DocDate BETWEEN b.start_6m AND b.today THEN o.year_month END) AS \"Orders6Months\",
    (
        SELECT COUNT(DISTINCT TO_CHAR(OINV.DocDate, 'YYYY-MM'))
        FROM OINV
        INNER JOIN INV1 ON OINV.DocEntry = INV1.DocEntry
        WHERE INV1.ItemCode = o.ItemCode
            AND OINV.DocDate BETWEEN b.start_6m AND b.today
            AND OINV.CANCELED = 'N'
    ) AS \"Sales6Months\"
FROM orders o
CROSS JOIN bounds b
GROUP BY
    o.ItemCode,
    o.ItemName,
    o.CardCode,
    b.today,
    b.start_30d,
    b.start_6m
ORDER BY
    \"Hits12Months\" DESC";

const IN_TRANSIT_SQL: &str = "\
SELECT
    POR1.ItemCode AS \"ItemCode\",
    OITM.ItemName AS \"ItemName\",
    CAST(SUM(POR1.InvQty) AS INTEGER) AS \"MonthlyQuantity\",
    TO_CHAR(POR1.ShipDate, 'YYYY-MM') AS \"YearMonth\"
FROM OPOR
INNER JOIN POR1 ON OPOR.DocEntry = POR1.DocEntry
INNER JOIN OITM ON POR1.ItemCode = OITM.ItemCode
WHERE
    POR1.ShipDate BETWEEN DATE_TRUNC('month', CURRENT_DATE)
        AND DATE_TRUNC('month', CURRENT_DATE) + INTERVAL '12 months'
    AND OPOR.CANCELED = 'N'
GROUP BY
    POR1.ItemCode,
    OITM.ItemName,
    TO_CHAR(POR1.ShipDate, 'YYYY-MM')
ORDER BY
    POR1.ItemCode,
    \"YearMonth\"";

#[async_trait]
impl InventoryRepo for SqlInventoryRepo {
    async fn stock_hits(&self) -> RepoResult<QueryRecord> {
        translate("stock_hits", async {
            tracing::debug!(report = "stock_hits", query = STOCK_HITS_SQL, "Executing report query");
            let rows = self.executor.fetch_all(STOCK_HITS_SQL, &[]).await?;
            Ok::<_, DriverError>(QueryRecord::new(rows, STOCK_HITS_SQL))
        })
        .await
    }

    async fn in_transit_orders(&self) -> RepoResult<QueryRecord> {
        translate("in_transit_orders", async {
            tracing::debug!(report = "in_transit_orders", query = IN_TRANSIT_SQL, "Executing report query");
            let rows = self.executor.fetch_all(IN_TRANSIT_SQL, &[]).await?;
            Ok::<_, DriverError>(QueryRecord::new(rows, IN_TRANSIT_SQL))
        })
        .await
    }

    async fn sales_orders(&self, range: &DateRangeParams) -> RepoResult<QueryRecord> {
        translate("sales_orders", async {
            let dates = prepare_dates(range.start(), range.end(), &SALES_ORDER_DATES)?;
            let query = format!(
                "WITH {}
SELECT
    INV1.ItemCode AS \"ItemCode\",
    OITM.ItemName AS \"ItemName\",
    COALESCE(OITM.CardCode, '') AS \"CardCode\",
    TO_CHAR(OINV.DocDate, 'YYYY-MM') AS \"YearMonth\",
    CAST(SUM(INV1.Quantity) AS NUMERIC(19, 1)) AS \"QuantitySold\"
FROM OINV
INNER JOIN INV1 ON OINV.DocEntry = INV1.DocEntry
INNER JOIN OITM ON INV1.ItemCode = OITM.ItemCode
CROSS JOIN period
WHERE
    OINV.DocDate BETWEEN period.start_date AND period.end_date
    AND OINV.CANCELED = 'N'
    AND OITM.ItmsGrpCod IN (101, 102, 103)
    AND OITM.validFor = 'Y'
GROUP BY
    INV1.ItemCode,
    OITM.ItemName,
    OITM.CardCode,
    TO_CHAR(OINV.DocDate, 'YYYY-MM')
ORDER BY
    INV1.ItemCode,
    \"YearMonth\"",
                period_cte(&dates)
            );
            tracing::debug!(report = "sales_orders", %query, "Executing report query");

            let rows = self.executor.fetch_all(&query, &[]).await?;
            Ok::<_, RepoError>(QueryRecord::new(rows, query))
        })
        .await
    }

    async fn product_outflow(&self, range: &DateRangeParams) -> RepoResult<QueryRecord> {
        translate("product_outflow", async {
            let dates = prepare_dates(range.start(), range.end(), &PRODUCT_OUTFLOW_DATES)?;
            let query = format!(
                "WITH {},
products AS (
    SELECT
        OITM.ItemCode,
        OITM.ItemName,
        OCRD.CardCode,
        OCRD.CardName
    FROM OITM
    LEFT JOIN OCRD ON OITM.CardCode = OCRD.CardCode
    WHERE OITM.validFor = 'Y'
        AND OITM.ItmsGrpCod IN (101, 102, 103)
),
movements AS (
    SELECT
        INV1.ItemCode,
        TO_CHAR(INV1.ActDelDate, 'YYYY-MM') AS year_month,
        SUM(INV1.InvQty) AS quantity
    FROM INV1
    INNER JOIN OINV ON INV1.DocEntry = OINV.DocEntry
    CROSS JOIN period
    WHERE INV1.ActDelDate BETWEEN period.start_date AND period.end_date
        AND INV1.Usage IN ('25', '21', '12', '27', '34', '16', '38', '15')
        AND INV1.LineStatus = 'O'
        AND OINV.CANCELED = 'N'
    GROUP BY INV1.ItemCode, TO_CHAR(INV1.ActDelDate, 'YYYY-MM')

    UNION ALL

    SELECT
        DLN1.ItemCode,
        TO_CHAR(DLN1.ActDelDate, 'YYYY-MM'),
        SUM(DLN1.InvQty)
    FROM DLN1
    INNER JOIN ODLN ON DLN1.DocEntry = ODLN.DocEntry
    CROSS JOIN period
    WHERE DLN1.ActDelDate BETWEEN period.start_date AND period.end_date
        AND DLN1.LineStatus = 'O'
        AND DLN1.Usage IN ('32', '1', '18', '17', '25', '21', '7', '12', '16')
        AND ODLN.CANCELED = 'N'
    GROUP BY DLN1.ItemCode, TO_CHAR(DLN1.ActDelDate, 'YYYY-MM')
)
SELECT
    p.ItemCode AS \"ItemCode\",
    p.ItemName AS \"ItemName\",
    COALESCE(p.CardCode, '') AS \"CardCode\",
    COALESCE(p.CardName, '') AS \"CardName\",
    m.year_month AS \"YearMonth\",
    SUM(m.quantity) AS \"Total\"
FROM products p
INNER JOIN movements m ON m.ItemCode = p.ItemCode
GROUP BY
    p.ItemCode,
    p.ItemName,
    p.CardCode,
    p.CardName,
    m.year_month
ORDER BY
    p.ItemCode,
    m.year_month",
                period_cte(&dates)
            );
            tracing::debug!(report = "product_outflow", %query, "Executing report query");

            let rows = self.executor.fetch_all(&query, &[]).await?;
            Ok::<_, RepoError>(QueryRecord::new(rows, query))
        })
        .await
    }
}
