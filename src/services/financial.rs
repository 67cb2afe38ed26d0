use std::sync::Arc;

use super::error::{Fault, ServiceResult, guard};
use crate::{
    db::{FinancialRepo, PROFITABILITY_DATES, dates::prepare_dates},
    models::{DateRangeParams, QueryRecord},
};

/// Service layer for financial reports
#[derive(Clone)]
pub struct FinancialService {
    repo: Arc<dyn FinancialRepo>,
}

impl FinancialService {
    pub fn new(repo: Arc<dyn FinancialRepo>) -> Self {
        Self { repo }
    }

    pub async fn item_profitability(&self, range: &DateRangeParams) -> ServiceResult<QueryRecord> {
        guard("item_profitability", async {
            prepare_dates(range.start(), range.end(), &PROFITABILITY_DATES)?;
            Ok::<_, Fault>(self.repo.item_profitability(range).await?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{DriverErrorKind, SqlFinancialRepo, mock::MockExecutor},
        models::Row,
        services::ServiceError,
    };

    fn service(mock: &MockExecutor) -> FinancialService {
        FinancialService::new(Arc::new(SqlFinancialRepo::new(Arc::new(mock.clone()))))
    }

    #[tokio::test]
    async fn test_item_profitability() {
        let rows = vec![Row::new().with("ItemCode", "I1").with("Rentabilidade", 12.5)];
        let mock = MockExecutor::new().with_rows(rows.clone());

        let record = service(&mock)
            .item_profitability(&DateRangeParams::new(Some("2024-01-01"), None))
            .await
            .unwrap();

        assert_eq!(record.data, rows);
        assert!(record.query.contains("CAST('2024-01-01' AS DATE)"));
        assert!(record.query.contains("CAST(CURRENT_DATE AS DATE) AS end_date"));
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let mock = MockExecutor::new();

        let record = service(&mock)
            .item_profitability(&DateRangeParams::default())
            .await
            .unwrap();

        assert!(record.data.is_empty());
    }

    #[tokio::test]
    async fn test_bad_date_rejected_before_io() {
        let mock = MockExecutor::new();

        let err = service(&mock)
            .item_profitability(&DateRangeParams::new(Some("2024/01/01"), None))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_future_start_without_end_rejected_before_io() {
        let mock = MockExecutor::new();

        let err = service(&mock)
            .item_profitability(&DateRangeParams::new(Some("2099-01-01"), None))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let mock = MockExecutor::new().with_error(DriverErrorKind::Operational, "timeout");

        let err = service(&mock)
            .item_profitability(&DateRangeParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Service { .. }));
        assert!(err.to_string().contains("conexão"));
        assert!(err.to_string().contains("timeout"));
    }
}
