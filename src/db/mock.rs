//! Scripted executor for repository and service tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{
    error::{DriverError, DriverErrorKind, DriverResult},
    executor::QueryExecutor,
};
use crate::models::{ResultSet, Row, Value};

/// One statement the mock has seen.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub query: String,
    pub params: Vec<Value>,
}

enum Response {
    Rows(ResultSet),
    Fail(DriverErrorKind, String),
}

/// Answers queries from a queue of canned responses and records every call.
///
/// When the queue is empty every call returns an empty result set.
#[derive(Clone, Default)]
pub struct MockExecutor {
    responses: Arc<Mutex<VecDeque<Response>>>,
    recorded: Arc<Mutex<Vec<RecordedQuery>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn with_rows(self, rows: ResultSet) -> Self {
        self.responses.lock().unwrap().push_back(Response::Rows(rows));
        self
    }

    /// Queue a driver failure.
    pub fn with_error(self, kind: DriverErrorKind, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Response::Fail(kind, message.to_string()));
        self
    }

    pub fn recorded(&self) -> Vec<RecordedQuery> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<String> {
        self.recorded.lock().unwrap().last().map(|r| r.query.clone())
    }

    fn answer(&self, query: &str, params: &[Value]) -> DriverResult<ResultSet> {
        self.recorded.lock().unwrap().push(RecordedQuery {
            query: query.to_string(),
            params: params.to_vec(),
        });
        match self.responses.lock().unwrap().pop_front() {
            Some(Response::Rows(rows)) => Ok(rows),
            Some(Response::Fail(kind, message)) => Err(DriverError::new(kind, message)),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    fn backend(&self) -> &'static str {
        "mock"
    }

    async fn fetch_all(&self, query: &str, params: &[Value]) -> DriverResult<ResultSet> {
        self.answer(query, params)
    }

    async fn fetch_one(&self, query: &str, params: &[Value]) -> DriverResult<Option<Row>> {
        Ok(self.answer(query, params)?.into_iter().next())
    }
}
