use std::sync::Arc;

use super::{
    error::{Fault, ServiceResult, guard},
    tabular::{PivotSpec, pivot_rows},
};
use crate::{
    db::{InventoryRepo, PRODUCT_OUTFLOW_DATES, SALES_ORDER_DATES, dates::prepare_dates},
    models::{DateRangeParams, QueryRecord},
};

const ITEM_INDEX: &[&str] = &["ItemCode", "ItemName"];
const SUPPLIER_ITEM_INDEX: &[&str] = &["ItemCode", "ItemName", "CardCode"];
const OUTFLOW_INDEX: &[&str] = &["ItemCode", "ItemName", "CardCode", "CardName"];
const MONTH_BUCKETS: &[&str] = &["YearMonth"];

/// Service layer for stock and purchasing reports
#[derive(Clone)]
pub struct InventoryService {
    repo: Arc<dyn InventoryRepo>,
}

impl InventoryService {
    pub fn new(repo: Arc<dyn InventoryRepo>) -> Self {
        Self { repo }
    }

    pub async fn stock_hits(&self) -> ServiceResult<QueryRecord> {
        guard("stock_hits", async { Ok::<_, Fault>(self.repo.stock_hits().await?) }).await
    }

    /// Open purchase quantities, one `YYYY-MM` column per ship month.
    pub async fn in_transit_orders(&self) -> ServiceResult<QueryRecord> {
        guard("in_transit_orders", async {
            let record = self.repo.in_transit_orders().await?;
            let spec = PivotSpec::new(ITEM_INDEX, MONTH_BUCKETS, "MonthlyQuantity");
            Ok::<_, Fault>(record.try_map(|rows| pivot_rows(rows, &spec))?)
        })
        .await
    }

    /// Invoiced quantities per item and supplier, one `YYYY-MM` column per
    /// month in the range.
    pub async fn sales_orders(&self, range: &DateRangeParams) -> ServiceResult<QueryRecord> {
        guard("sales_orders", async {
            prepare_dates(range.start(), range.end(), &SALES_ORDER_DATES)?;

            let record = self.repo.sales_orders(range).await?;
            let spec = PivotSpec::new(SUPPLIER_ITEM_INDEX, MONTH_BUCKETS, "QuantitySold");
            Ok::<_, Fault>(record.try_map(|rows| pivot_rows(rows, &spec))?)
        })
        .await
    }

    /// Outgoing quantities per item and supplier, one `YYYY-MM` column per
    /// month in the range.
    pub async fn product_outflow(&self, range: &DateRangeParams) -> ServiceResult<QueryRecord> {
        guard("product_outflow", async {
            prepare_dates(range.start(), range.end(), &PRODUCT_OUTFLOW_DATES)?;

            let record = self.repo.product_outflow(range).await?;
            let spec = PivotSpec::new(OUTFLOW_INDEX, MONTH_BUCKETS, "Total");
            Ok::<_, Fault>(record.try_map(|rows| pivot_rows(rows, &spec))?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        db::{DriverErrorKind, SqlInventoryRepo, mock::MockExecutor},
        models::{Row, Value},
        services::ServiceError,
    };

    fn service(mock: &MockExecutor) -> InventoryService {
        InventoryService::new(Arc::new(SqlInventoryRepo::new(Arc::new(mock.clone()))))
    }

    fn sale(item: &str, supplier: &str, month: &str, qty: i64) -> Row {
        Row::new()
            .with("ItemCode", item)
            .with("ItemName", format!("Produto {item}"))
            .with("CardCode", supplier)
            .with("YearMonth", month)
            .with("QuantitySold", Decimal::new(qty * 10, 1))
    }

    #[tokio::test]
    async fn test_stock_hits_passes_rows_through() {
        let rows = vec![Row::new().with("ItemCode", "I1").with("Hits12Months", 3)];
        let mock = MockExecutor::new().with_rows(rows.clone());

        let record = service(&mock).stock_hits().await.unwrap();

        assert_eq!(record.data, rows);
    }

    #[tokio::test]
    async fn test_in_transit_orders_pivot_by_month() {
        let mock = MockExecutor::new().with_rows(vec![
            Row::new()
                .with("ItemCode", "I1")
                .with("ItemName", "Produto I1")
                .with("MonthlyQuantity", 10)
                .with("YearMonth", "2025-02"),
            Row::new()
                .with("ItemCode", "I1")
                .with("ItemName", "Produto I1")
                .with("MonthlyQuantity", 5)
                .with("YearMonth", "2025-01"),
        ]);

        let record = service(&mock).in_transit_orders().await.unwrap();

        assert_eq!(record.data.len(), 1);
        let columns: Vec<_> = record.data[0].columns().collect();
        assert_eq!(columns, ["ItemCode", "ItemName", "2025-01", "2025-02"]);
        assert_eq!(record.data[0].get("2025-02"), Some(&Value::Int(10)));
    }

    #[tokio::test]
    async fn test_sales_orders_pivot_per_supplier() {
        let mock = MockExecutor::new().with_rows(vec![
            sale("I1", "F1", "2024-01", 3),
            sale("I1", "F2", "2024-02", 4),
        ]);
        let range = DateRangeParams::new(Some("2024-01-01"), Some("2024-02-29"));

        let record = service(&mock).sales_orders(&range).await.unwrap();

        assert_eq!(record.data.len(), 2);
        assert_eq!(record.data[0].get("2024-01"), Some(&Value::Decimal(Decimal::new(30, 1))));
        assert_eq!(record.data[0].get("2024-02"), Some(&Value::Int(0)));
        assert!(record.query.contains("CAST('2024-01-01' AS DATE)"));
    }

    #[tokio::test]
    async fn test_inverted_range_is_validation_error_before_io() {
        let mock = MockExecutor::new();
        let range = DateRangeParams::new(Some("2024-03-01"), Some("2024-01-01"));

        let err = service(&mock).sales_orders(&range).await.unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(err.to_string(), "A data de início não pode ser maior que a data de fim.");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_start_after_default_end_is_validation_error_before_io() {
        let mock = MockExecutor::new();
        let range = DateRangeParams::new(Some("2099-01-01"), None);

        let err = service(&mock).sales_orders(&range).await.unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(err.to_string(), "A data de início não pode ser maior que a data de fim.");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_date_is_validation_error() {
        let mock = MockExecutor::new();
        let range = DateRangeParams::new(None, Some("2024-13"));

        let err = service(&mock).product_outflow(&range).await.unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(err.to_string().contains("end_date"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_product_outflow_empty_is_not_found() {
        let mock = MockExecutor::new();

        let err = service(&mock)
            .product_outflow(&DateRangeParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::DataNotFound(_)));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_product_outflow_pivot() {
        let mock = MockExecutor::new().with_rows(vec![
            Row::new()
                .with("ItemCode", "I1")
                .with("ItemName", "Produto I1")
                .with("CardCode", "F1")
                .with("CardName", "Fornecedor")
                .with("YearMonth", "2024-05")
                .with("Total", 7),
        ]);

        let record = service(&mock)
            .product_outflow(&DateRangeParams::default())
            .await
            .unwrap();

        let columns: Vec<_> = record.data[0].columns().collect();
        assert_eq!(columns, ["ItemCode", "ItemName", "CardCode", "CardName", "2024-05"]);
    }

    #[tokio::test]
    async fn test_stock_hits_driver_failure() {
        let mock = MockExecutor::new().with_error(DriverErrorKind::Unknown, "???");

        let err = service(&mock).stock_hits().await.unwrap_err();

        assert!(err.to_string().starts_with("Erro no repositório"));
    }
}
