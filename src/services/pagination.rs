use serde::Deserialize;
use validator::Validate;

use super::error::{ServiceError, ServiceResult};

/// Row window for paginated reports.
///
/// Either `offset`/`fetch_next` or `page`/`page_size`; when `page_size` is set
/// it takes precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct Pagination {
    #[serde(default)]
    #[validate(range(min = 0, message = "offset não pode ser negativo"))]
    pub offset: i64,

    #[validate(range(min = 1, message = "fetch_next deve ser maior que zero"))]
    pub fetch_next: Option<i64>,

    #[validate(range(min = 1, message = "page deve ser maior ou igual a 1"))]
    pub page: Option<i64>,

    #[validate(range(min = 1, message = "page_size deve ser maior que zero"))]
    pub page_size: Option<i64>,
}

/// Fields in the order their problems are reported.
const FIELDS: [&str; 4] = ["offset", "fetch_next", "page", "page_size"];

impl Pagination {
    pub fn new(offset: i64, fetch_next: Option<i64>) -> Self {
        Self {
            offset,
            fetch_next,
            ..Self::default()
        }
    }

    pub fn pages(page: Option<i64>, page_size: i64) -> Self {
        Self {
            page,
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// Effective `(offset, fetch_next)` for the repository.
    pub fn window(&self) -> (i64, Option<i64>) {
        match self.page_size {
            Some(size) => {
                let page = self.page.unwrap_or(1);
                (page.saturating_sub(1).saturating_mul(size), Some(size))
            }
            None => (self.offset, self.fetch_next),
        }
    }
}

/// Reject a window before anything touches the database.
pub fn validate_pagination(pagination: &Pagination) -> ServiceResult<()> {
    let Err(errors) = pagination.validate() else {
        return Ok(());
    };

    let field_errors = errors.field_errors();
    let message = FIELDS
        .iter()
        .filter_map(|field| field_errors.get(*field))
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref())
        .map(|m| m.to_string())
        .unwrap_or_else(|| errors.to_string());

    Err(ServiceError::Validation(message))
}
