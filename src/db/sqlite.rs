use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    Column, ConnectOptions, Row as SqlxRow, Sqlite, TypeInfo, ValueRef,
    sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow},
};

use super::{
    error::{DriverError, DriverErrorKind, DriverResult},
    executor::{QueryExecutor, release},
};
use crate::{
    config::SqliteConfig,
    models::{ResultSet, Row, Value},
};

const BACKEND: &str = "sqlite";

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, <Sqlite as sqlx::Database>::Arguments<'q>>;

/// Executor over a SQLite file, one connection per call.
pub struct SqliteExecutor {
    options: SqliteConnectOptions,
}

impl SqliteExecutor {
    pub fn new(config: &SqliteConfig) -> DriverResult<Self> {
        let options = if config.path == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.path)
                .create_if_missing(config.create_if_missing)
        };

        Ok(Self {
            options: options.busy_timeout(Duration::from_millis(config.busy_timeout_ms)),
        })
    }

    async fn connect(&self) -> DriverResult<SqliteConnection> {
        Ok(self.options.connect().await?)
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn fetch_all(&self, query: &str, params: &[Value]) -> DriverResult<ResultSet> {
        let mut conn = self.connect().await?;
        let result = bind_params(sqlx::query(query), params)
            .fetch_all(&mut conn)
            .await;
        release(conn, BACKEND).await;

        result?.iter().map(decode_row).collect()
    }

    async fn fetch_one(&self, query: &str, params: &[Value]) -> DriverResult<Option<Row>> {
        let mut conn = self.connect().await?;
        let result = bind_params(sqlx::query(query), params)
            .fetch_optional(&mut conn)
            .await;
        release(conn, BACKEND).await;

        result?.as_ref().map(decode_row).transpose()
    }
}

fn bind_params<'q>(mut query: SqliteQuery<'q>, params: &'q [Value]) -> SqliteQuery<'q> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(x) => query.bind(*x),
            // SQLite has no exact numeric type
            Value::Decimal(d) => query.bind(d.to_string()),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Date(d) => query.bind(*d),
            Value::Timestamp(t) => query.bind(*t),
        };
    }
    query
}

/// Decode by the storage class of each value.
fn decode_row(row: &SqliteRow) -> DriverResult<Row> {
    let mut out = Row::with_capacity(row.columns().len());

    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => Value::Int(row.try_get::<i64, _>(i)?),
                "REAL" => Value::Float(row.try_get::<f64, _>(i)?),
                "TEXT" | "NUMERIC" | "DATE" | "TIME" | "DATETIME" => {
                    Value::Text(row.try_get::<String, _>(i)?)
                }
                "BLOB" => Value::Text(hex::encode(row.try_get::<Vec<u8>, _>(i)?)),
                other => {
                    return Err(DriverError::new(
                        DriverErrorKind::Data,
                        format!(
                            "unsupported SQLite type {other} in column {}",
                            column.name()
                        ),
                    ));
                }
            }
        };
        out.insert(column.name(), value);
    }

    Ok(out)
}
