mod dashboard;
mod error;
mod financial;
mod inventory;
mod logistics;
pub mod pagination;
pub mod tabular;

pub use dashboard::{DashboardService, MIN_YEAR, check_year};
pub use error::{Fault, ServiceError, ServiceResult, guard, translate};
pub use financial::FinancialService;
pub use inventory::InventoryService;
pub use logistics::LogisticsService;
pub use pagination::{Pagination, validate_pagination};

use crate::db::Database;

/// Container for all report services
#[derive(Clone)]
pub struct Services {
    pub logistics: LogisticsService,
    pub inventory: InventoryService,
    pub financial: FinancialService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(db: &Database) -> Self {
        Self {
            logistics: LogisticsService::new(db.logistics()),
            inventory: InventoryService::new(db.inventory()),
            financial: FinancialService::new(db.financial()),
            dashboard: DashboardService::new(db.dashboard()),
        }
    }
}
