mod dashboard;
mod financial;
mod inventory;
mod logistics;

use std::future::Future;

pub use dashboard::*;
pub use financial::*;
pub use inventory::*;
pub use logistics::*;

use super::{
    dates::PreparedDates,
    error::{RepoError, RepoResult},
};

/// Run one repository data-access call, translating any low-level failure
/// into the repository taxonomy.
///
/// Nothing is retried: a failure is terminal for the current request.
pub async fn translate<T, E, F>(report: &'static str, op: F) -> RepoResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<RepoError>,
{
    op.await.map_err(|e| {
        let err = e.into();
        tracing::warn!(report, error = %err, "Report query failed");
        err
    })
}

/// Leading CTE exposing the resolved bounds as `period.start_date` and
/// `period.end_date`.
pub(crate) fn period_cte(dates: &PreparedDates) -> String {
    format!(
        "period AS (\n    SELECT\n        CAST({} AS DATE) AS start_date,\n        CAST({} AS DATE) AS end_date\n)",
        dates.start_sql, dates.end_sql
    )
}

/// Row window in the standard `OFFSET .. FETCH` form. Without `fetch_next`
/// every remaining row is returned.
pub(crate) fn window_clause(offset: i64, fetch_next: Option<i64>) -> String {
    match fetch_next {
        Some(fetch_next) => {
            format!("OFFSET {offset} ROWS\nFETCH NEXT {fetch_next} ROWS ONLY")
        }
        None => format!("OFFSET {offset} ROWS"),
    }
}
