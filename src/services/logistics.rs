use std::sync::Arc;

use super::{
    error::{Fault, ServiceResult, guard},
    pagination::{Pagination, validate_pagination},
    tabular::{PivotSpec, pivot_rows},
};
use crate::{db::LogisticsRepo, models::QueryRecord};

const CARRIER_INDEX: &[&str] = &["CardCode", "CardName"];
const CARRIER_BUCKETS: &[&str] = &["Mes", "Ano"];

/// Service layer for freight reports
#[derive(Clone)]
pub struct LogisticsService {
    repo: Arc<dyn LogisticsRepo>,
}

impl LogisticsService {
    pub fn new(repo: Arc<dyn LogisticsRepo>) -> Self {
        Self { repo }
    }

    /// One row per carrier with a `<month>-<year>` invoice count column for
    /// every month in the window.
    pub async fn most_used_carriers(&self, pagination: Pagination) -> ServiceResult<QueryRecord> {
        guard("most_used_carriers", async {
            validate_pagination(&pagination)?;
            let (offset, fetch_next) = pagination.window();

            let record = self.repo.most_used_carriers(offset, fetch_next).await?;
            let spec = PivotSpec::new(CARRIER_INDEX, CARRIER_BUCKETS, "Total");
            Ok::<_, Fault>(record.try_map(|rows| pivot_rows(rows, &spec))?)
        })
        .await
    }

    pub async fn count_carriers(&self) -> ServiceResult<QueryRecord<i64>> {
        guard("count_carriers", async {
            Ok::<_, Fault>(self.repo.count_carriers().await?)
        })
        .await
    }
}
