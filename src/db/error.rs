use thiserror::Error;

use super::dates::DateRangeError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Broad category of a failure raised by a database driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// Driver or connection-string misconfiguration.
    Interface,
    /// Network, I/O, authentication or server availability.
    Operational,
    /// Malformed SQL or reference to a missing object.
    Programming,
    /// A value the database or decoder could not coerce.
    Data,
    /// A parameter that could not be bound.
    Value,
    /// Any other error reported by the database itself.
    Database,
    Unknown,
}

/// A failure raised while opening a connection or running a query.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DriverError {
    kind: DriverErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> DriverErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
impl From<sqlx::Error> for DriverError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Configuration(_) => DriverErrorKind::Interface,
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DriverErrorKind::Operational,
            sqlx::Error::Database(db_err) => {
                classify_database_error(db_err.code().as_deref(), db_err.message())
            }
            sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => DriverErrorKind::Data,
            sqlx::Error::Encode(_) => DriverErrorKind::Value,
            sqlx::Error::RowNotFound => DriverErrorKind::Database,
            _ => DriverErrorKind::Unknown,
        };
        DriverError::new(kind, err.to_string()).with_source(err)
    }
}

/// Classify an error reported by the server from its code and message.
///
/// Five-character codes are SQLSTATE (PostgreSQL and most ANSI engines);
/// shorter numeric codes are SQLite result codes.
pub fn classify_database_error(code: Option<&str>, message: &str) -> DriverErrorKind {
    let Some(code) = code else {
        return DriverErrorKind::Database;
    };

    if code.len() == 5 {
        return match code.get(..2) {
            // connection exception, insufficient resources, operator intervention, system error
            Some("08" | "53" | "57" | "58") => DriverErrorKind::Operational,
            // syntax error or access rule violation
            Some("42") => DriverErrorKind::Programming,
            // data exception
            Some("22") => DriverErrorKind::Data,
            _ => DriverErrorKind::Database,
        };
    }

    match code.parse::<i64>().map(|c| c & 0xff) {
        Ok(1) if message.contains("syntax error") || message.starts_with("no such") => {
            DriverErrorKind::Programming
        }
        // BUSY, LOCKED, IOERR, CANTOPEN, NOTADB
        Ok(5 | 6 | 10 | 14 | 26) => DriverErrorKind::Operational,
        // TOOBIG, MISMATCH, RANGE
        Ok(18 | 20 | 25) => DriverErrorKind::Data,
        _ => DriverErrorKind::Database,
    }
}

/// Repository-level failures. Every variant keeps the driver message as
/// `details` and chains the original error.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{message}: {details}")]
    Connection {
        message: &'static str,
        details: String,
        #[source]
        source: BoxError,
    },

    #[error("{message}: {details}")]
    Query {
        message: &'static str,
        details: String,
        #[source]
        source: BoxError,
    },

    #[error("{message}: {details}")]
    Repository {
        message: &'static str,
        details: String,
        #[source]
        source: BoxError,
    },
}

impl RepoError {
    pub fn details(&self) -> &str {
        match self {
            RepoError::Connection { details, .. }
            | RepoError::Query { details, .. }
            | RepoError::Repository { details, .. } => details,
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

impl From<DriverError> for RepoError {
    fn from(err: DriverError) -> Self {
        let details = err.message.clone();
        match err.kind {
            DriverErrorKind::Interface => RepoError::Connection {
                message: "Falha na configuração do driver de banco de dados",
                details,
                source: Box::new(err),
            },
            DriverErrorKind::Operational => RepoError::Connection {
                message: "Não foi possível conectar ao banco de dados",
                details,
                source: Box::new(err),
            },
            DriverErrorKind::Programming => RepoError::Query {
                message: "Erro na query SQL",
                details,
                source: Box::new(err),
            },
            DriverErrorKind::Data => RepoError::Query {
                message: "Erro de dados na query",
                details,
                source: Box::new(err),
            },
            DriverErrorKind::Value => RepoError::Query {
                message: "Erro de valor",
                details,
                source: Box::new(err),
            },
            DriverErrorKind::Database => RepoError::Repository {
                message: "Erro no banco de dados",
                details,
                source: Box::new(err),
            },
            DriverErrorKind::Unknown => RepoError::Repository {
                message: "Erro inesperado no repositório",
                details,
                source: Box::new(err),
            },
        }
    }
}

/// A bad date range reaching the repository is a value error during binding.
impl From<DateRangeError> for RepoError {
    fn from(err: DateRangeError) -> Self {
        RepoError::Query {
            message: "Erro de valor",
            details: err.to_string(),
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(DriverErrorKind::Interface, "Connection", "Falha na configuração do driver")]
    #[case(DriverErrorKind::Operational, "Connection", "Não foi possível conectar")]
    #[case(DriverErrorKind::Programming, "Query", "Erro na query SQL")]
    #[case(DriverErrorKind::Data, "Query", "Erro de dados na query")]
    #[case(DriverErrorKind::Value, "Query", "Erro de valor")]
    #[case(DriverErrorKind::Database, "Repository", "Erro no banco de dados")]
    #[case(DriverErrorKind::Unknown, "Repository", "Erro inesperado no repositório")]
    fn test_driver_kind_maps_to_repo_error(
        #[case] kind: DriverErrorKind,
        #[case] expected_variant: &str,
        #[case] expected_prefix: &str,
    ) {
        let err = RepoError::from(DriverError::new(kind, "Simulated database error"));

        let variant = match &err {
            RepoError::Connection { .. } => "Connection",
            RepoError::Query { .. } => "Query",
            RepoError::Repository { .. } => "Repository",
        };
        assert_eq!(variant, expected_variant);

        let text = err.to_string();
        assert!(text.starts_with(expected_prefix), "got: {text}");
        assert!(text.ends_with(": Simulated database error"), "got: {text}");
        assert_eq!(err.details(), "Simulated database error");
    }

    #[test]
    fn test_repo_error_chains_driver_error() {
        let err = RepoError::from(DriverError::new(DriverErrorKind::Operational, "refused"));
        let source = err.source().expect("source is chained");
        assert_eq!(source.to_string(), "refused");
    }

    #[test]
    fn test_date_range_error_is_query_error() {
        let err = RepoError::from(DateRangeError::InvertedRange);
        assert!(matches!(err, RepoError::Query { .. }));
        assert!(err.to_string().contains("data de início"));
    }

    #[rstest]
    #[case(Some("08006"), "", DriverErrorKind::Operational)]
    #[case(Some("57P01"), "", DriverErrorKind::Operational)]
    #[case(Some("42601"), "syntax error at or near", DriverErrorKind::Programming)]
    #[case(Some("42P01"), "relation \"oinv\" does not exist", DriverErrorKind::Programming)]
    #[case(Some("22012"), "division by zero", DriverErrorKind::Data)]
    #[case(Some("23505"), "duplicate key", DriverErrorKind::Database)]
    #[case(Some("1"), "near \"SELEC\": syntax error", DriverErrorKind::Programming)]
    #[case(Some("1"), "no such table: OINV", DriverErrorKind::Programming)]
    #[case(Some("1"), "something else", DriverErrorKind::Database)]
    #[case(Some("5"), "database is locked", DriverErrorKind::Operational)]
    #[case(Some("14"), "unable to open database file", DriverErrorKind::Operational)]
    #[case(Some("20"), "datatype mismatch", DriverErrorKind::Data)]
    #[case(Some("2067"), "UNIQUE constraint failed", DriverErrorKind::Database)]
    #[case(None, "whatever", DriverErrorKind::Database)]
    fn test_classify_database_error(
        #[case] code: Option<&str>,
        #[case] message: &str,
        #[case] expected: DriverErrorKind,
    ) {
        assert_eq!(classify_database_error(code, message), expected);
    }

    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    #[test]
    fn test_sqlx_errors_are_classified() {
        let err = DriverError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), DriverErrorKind::Operational);

        let err = DriverError::from(sqlx::Error::Configuration("bad url".into()));
        assert_eq!(err.kind(), DriverErrorKind::Interface);

        let err = DriverError::from(sqlx::Error::ColumnNotFound("Total".into()));
        assert_eq!(err.kind(), DriverErrorKind::Data);

        let err = DriverError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), DriverErrorKind::Database);
    }
}
