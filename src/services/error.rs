use std::future::Future;

use thiserror::Error;

use super::tabular::TabularError;
use crate::db::{BoxError, RepoError, dates::DateRangeError};

/// Failures surfaced by report services.
///
/// `Validation`, `BusinessRule` and `DataNotFound` are already categorized
/// when raised and pass through [`guard`] unchanged.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error("{0}")]
    DataNotFound(String),

    #[error("{message}")]
    DataTransformation {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("{message}")]
    Service {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRule(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::DataNotFound(message.into())
    }

    /// Caller-side problems, logged at `warn` rather than `error`.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::BusinessRule(_) | Self::DataNotFound(_)
        )
    }
}

/// Anything that can go wrong inside a service operation before it is
/// normalized into a [`ServiceError`].
#[derive(Debug, Error)]
pub enum Fault {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Tabular(#[from] TabularError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Other(BoxError),
}

impl Fault {
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }
}

/// Bad date input at the service boundary is the caller's mistake.
impl From<DateRangeError> for Fault {
    fn from(err: DateRangeError) -> Self {
        Self::Service(ServiceError::Validation(err.to_string()))
    }
}

impl From<Fault> for ServiceError {
    fn from(fault: Fault) -> Self {
        translate(fault)
    }
}

/// Map a raw fault onto the service taxonomy.
pub fn translate(fault: Fault) -> ServiceError {
    match fault {
        Fault::Repo(err) => {
            let message = match &err {
                RepoError::Connection { .. } => {
                    format!("Erro de conexão com o banco de dados: {err}")
                }
                RepoError::Query { .. } => format!("Erro ao executar consulta: {err}"),
                RepoError::Repository { .. } => format!("Erro no repositório: {err}"),
            };
            ServiceError::Service {
                message,
                source: Some(Box::new(err)),
            }
        }
        Fault::Tabular(TabularError::Empty) => {
            ServiceError::DataNotFound(TabularError::Empty.to_string())
        }
        Fault::Tabular(err) => {
            let prefix = match &err {
                TabularError::MissingField { .. } => "Campo não encontrado nos dados",
                TabularError::WrongType { .. } => "Tipo de dado inválido",
                TabularError::Arithmetic { .. } => "Erro de cálculo",
                TabularError::DuplicateColumn { .. } => "Coluna duplicada no resultado",
                TabularError::Empty => "Nenhum dado",
            };
            ServiceError::DataTransformation {
                message: format!("{prefix}: {err}"),
                source: Some(Box::new(err)),
            }
        }
        Fault::Service(err) => err,
        Fault::Other(err) => ServiceError::Service {
            message: format!("Erro inesperado no serviço: {err}"),
            source: Some(err),
        },
    }
}

/// Run one service operation and normalize whatever it fails with.
///
/// Nothing is retried.
pub async fn guard<T, F>(operation: &'static str, op: F) -> ServiceResult<T>
where
    F: Future<Output = Result<T, Fault>>,
{
    op.await.map_err(|fault| {
        let err = translate(fault);
        if err.is_client_error() {
            tracing::warn!(operation, error = %err, "Report request rejected");
        } else {
            tracing::error!(operation, error = %err, "Report request failed");
        }
        err
    })
}
