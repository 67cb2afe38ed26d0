use std::{any::Any, fmt::Display};

use axum::{
    Json,
    body::Body,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::services::ServiceError;

/// Shown instead of the real cause of an internal error outside debug mode.
pub const REDACTED_DETAILS: &str = "Erro interno";

/// The body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: bool,
    pub message: String,
    pub details: String,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    BusinessRule(String),
    Transformation(String),
    Service(String),
    Internal(String),
}

impl ApiError {
    /// Generic 500. `details` is only exposed when `debug` is set.
    pub fn internal(details: impl Display, debug: bool) -> Self {
        if debug {
            ApiError::Internal(details.to_string())
        } else {
            ApiError::Internal(REDACTED_DETAILS.to_string())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            ApiError::Transformation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Service(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Erro de validação",
            ApiError::NotFound(_) => "Dados não encontrados",
            ApiError::BusinessRule(_) => "Erro de regra de negócio",
            ApiError::Transformation(_) => "Erro na transformação de dados",
            ApiError::Service(_) => "Erro no serviço",
            ApiError::Internal(_) => "Erro interno do servidor",
        }
    }

    fn into_details(self) -> String {
        match self {
            ApiError::Validation(d)
            | ApiError::NotFound(d)
            | ApiError::BusinessRule(d)
            | ApiError::Transformation(d)
            | ApiError::Service(d)
            | ApiError::Internal(d) => d,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let details = err.to_string();
        match err {
            ServiceError::Validation(_) => ApiError::Validation(details),
            ServiceError::DataNotFound(_) => ApiError::NotFound(details),
            ServiceError::BusinessRule(_) => ApiError::BusinessRule(details),
            ServiceError::DataTransformation { .. } => ApiError::Transformation(details),
            ServiceError::Service { .. } => ApiError::Service(details),
        }
    }
}

/// Malformed query strings are the caller's mistake.
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        let details = self.into_details();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), category = message, %details, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), category = message, %details, "Request rejected");
        }

        (
            status,
            Json(ErrorEnvelope {
                error: true,
                message: message.to_string(),
                details,
            }),
        )
            .into_response()
    }
}

/// Turn a handler panic into the generic 500 envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>, debug: bool) -> Response<Body> {
    let details = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "panic without message".to_string()
    };

    ApiError::internal(details, debug).into_response()
}
