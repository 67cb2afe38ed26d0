use std::sync::Arc;

use chrono::{Datelike, Local};

use super::error::{Fault, ServiceError, ServiceResult, guard};
use crate::{db::DashboardRepo, models::QueryRecord};

/// Earliest year the invoice dashboard accepts.
pub const MIN_YEAR: i32 = 1900;

/// Service layer for the invoice dashboard
#[derive(Clone)]
pub struct DashboardService {
    repo: Arc<dyn DashboardRepo>,
}

impl DashboardService {
    pub fn new(repo: Arc<dyn DashboardRepo>) -> Self {
        Self { repo }
    }

    pub async fn invoices(&self, year: Option<i32>) -> ServiceResult<QueryRecord> {
        guard("invoices", async {
            if let Some(year) = year {
                check_year(year, Local::now().year())?;
            }
            Ok::<_, Fault>(self.repo.invoices(year).await?)
        })
        .await
    }
}

pub fn check_year(year: i32, current_year: i32) -> ServiceResult<()> {
    if year < MIN_YEAR {
        return Err(ServiceError::validation(format!(
            "Ano inválido: {year}. O ano deve ser maior ou igual a {MIN_YEAR}."
        )));
    }
    if year > current_year {
        return Err(ServiceError::business_rule(format!(
            "O ano {year} não pode ser maior que o ano atual ({current_year})."
        )));
    }
    Ok(())
}
