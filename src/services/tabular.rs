//! Column-oriented view over result sets and the long-to-wide pivot used by
//! the time-series reports.

use std::{cmp::Ordering, collections::HashMap};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use thiserror::Error;

use crate::models::{ResultSet, Row, Value};

/// Separator between the parts of a composite pivot key in generated column
/// names, e.g. `1-2024`.
pub const KEY_SEPARATOR: &str = "-";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TabularError {
    #[error("Nenhum dado disponível para pivotar.")]
    Empty,

    #[error("'{column}'")]
    MissingField { column: String },

    #[error("valor do tipo {found} na coluna '{column}' não é numérico")]
    WrongType { column: String, found: &'static str },

    #[error("{reason} na coluna '{column}'")]
    Arithmetic { column: String, reason: &'static str },

    #[error("a coluna '{column}' seria gerada mais de uma vez")]
    DuplicateColumn { column: String },
}

pub type TabularResult<T> = Result<T, TabularError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
    Count,
}

/// What to pivot: rows keyed by `index`, one generated column per distinct
/// `columns` tuple, cells aggregated from `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotSpec<'a> {
    pub index: &'a [&'a str],
    pub columns: &'a [&'a str],
    pub values: &'a str,
    pub aggregation: Aggregation,
    pub fill_value: Value,
}

impl<'a> PivotSpec<'a> {
    /// Sum aggregation, missing cells filled with `0`.
    pub fn new(index: &'a [&'a str], columns: &'a [&'a str], values: &'a str) -> Self {
        Self {
            index,
            columns,
            values,
            aggregation: Aggregation::Sum,
            fill_value: Value::Int(0),
        }
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn fill_value(mut self, fill_value: impl Into<Value>) -> Self {
        self.fill_value = fill_value.into();
        self
    }
}

/// Rows with a fixed column set. Columns missing from an input row are null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Columns are taken in order of first appearance across all rows.
    pub fn from_rows(rows: ResultSet) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for row in &rows {
            for column in row.columns() {
                if !positions.contains_key(column) {
                    positions.insert(column.to_string(), columns.len());
                    columns.push(column.to_string());
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells = vec![Value::Null; columns.len()];
                for (column, value) in row {
                    if let Some(&i) = positions.get(&column) {
                        cells[i] = value;
                    }
                }
                cells
            })
            .collect();

        Self { columns, rows }
    }

    pub fn into_rows(self) -> ResultSet {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|cells| columns.iter().cloned().zip(cells).collect::<Row>())
            .collect()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> TabularResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TabularError::MissingField {
                column: name.to_string(),
            })
    }

    /// Reshape long rows into one row per distinct `index` tuple with one
    /// column per distinct `columns` tuple.
    ///
    /// Rows with a null key are dropped. Duplicate cells are combined with the
    /// requested aggregation and absent cells take `fill_value`. Output rows and
    /// generated columns are sorted by key when every key position holds
    /// values of one comparable kind, otherwise they keep first-appearance
    /// order.
    pub fn pivot(&self, spec: &PivotSpec<'_>) -> TabularResult<Table> {
        if self.is_empty() {
            return Err(TabularError::Empty);
        }

        let index_cols = spec
            .index
            .iter()
            .map(|c| self.column_index(c))
            .collect::<TabularResult<Vec<_>>>()?;
        let pivot_cols = spec
            .columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<TabularResult<Vec<_>>>()?;
        let value_col = self.column_index(spec.values)?;

        let mut groups = KeySet::default();
        let mut buckets = KeySet::default();
        let mut cells: HashMap<(usize, usize), Accumulator> = HashMap::new();

        for row in &self.rows {
            let group_key: Vec<Value> = index_cols.iter().map(|&i| row[i].clone()).collect();
            let bucket_key: Vec<Value> = pivot_cols.iter().map(|&i| row[i].clone()).collect();
            if group_key.iter().chain(&bucket_key).any(Value::is_null) {
                continue;
            }

            let g = groups.intern(group_key);
            let b = buckets.intern(bucket_key);
            cells
                .entry((g, b))
                .or_default()
                .push(&row[value_col], spec.aggregation, spec.values)?;
        }

        if groups.is_empty() {
            return Err(TabularError::Empty);
        }

        let group_order = groups.order();
        let bucket_order = buckets.order();

        let mut columns: Vec<String> = spec.index.iter().map(|c| c.to_string()).collect();
        for &b in &bucket_order {
            let name = column_name(&buckets.keys[b]);
            if columns.contains(&name) {
                return Err(TabularError::DuplicateColumn { column: name });
            }
            columns.push(name);
        }

        let mut rows = Vec::with_capacity(group_order.len());
        for &g in &group_order {
            let mut out = groups.keys[g].clone();
            for &b in &bucket_order {
                let value = match cells.get(&(g, b)) {
                    Some(acc) => acc.finish(spec.aggregation, spec.values)?,
                    None => None,
                };
                out.push(value.unwrap_or_else(|| spec.fill_value.clone()));
            }
            rows.push(out);
        }

        Ok(Table { columns, rows })
    }
}

/// Pivot a result set directly.
pub fn pivot_rows(rows: ResultSet, spec: &PivotSpec<'_>) -> TabularResult<ResultSet> {
    Ok(Table::from_rows(rows).pivot(spec)?.into_rows())
}

fn column_name(key: &[Value]) -> String {
    key.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Distinct key tuples in order of first appearance.
#[derive(Default)]
struct KeySet {
    keys: Vec<Vec<Value>>,
    lookup: HashMap<String, usize>,
}

impl KeySet {
    fn intern(&mut self, key: Vec<Value>) -> usize {
        let fingerprint = fingerprint(&key);
        if let Some(&i) = self.lookup.get(&fingerprint) {
            return i;
        }
        let i = self.keys.len();
        self.lookup.insert(fingerprint, i);
        self.keys.push(key);
        i
    }

    fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Positions into `keys`, sorted when the keys are comparable.
    fn order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.keys.len()).collect();
        if self.sortable() {
            order.sort_by(|&a, &b| compare_keys(&self.keys[a], &self.keys[b]));
        }
        order
    }

    fn sortable(&self) -> bool {
        let Some(first) = self.keys.first() else {
            return true;
        };
        (0..first.len()).all(|pos| {
            let kind = Kind::of(&first[pos]);
            kind.is_some() && self.keys.iter().all(|key| Kind::of(&key[pos]) == kind)
        })
    }
}

/// Equality key for a tuple. Numbers compare by value across representations.
fn fingerprint(key: &[Value]) -> String {
    key.iter()
        .map(|v| match v {
            Value::Int(i) => format!("n:{i}"),
            Value::Decimal(d) => format!("n:{}", d.normalize()),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("n:{}", *f as i64),
            Value::Float(f) => format!("f:{f}"),
            other => format!("{}:{other}", other.type_name()),
        })
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Number,
    Text,
    Date,
    Timestamp,
    Bool,
}

impl Kind {
    fn of(value: &Value) -> Option<Kind> {
        match value {
            Value::Int(_) | Value::Decimal(_) => Some(Kind::Number),
            Value::Float(f) if !f.is_nan() => Some(Kind::Number),
            Value::Text(_) => Some(Kind::Text),
            Value::Date(_) => Some(Kind::Date),
            Value::Timestamp(_) => Some(Kind::Timestamp),
            Value::Bool(_) => Some(Kind::Bool),
            Value::Float(_) | Value::Null => None,
        }
    }
}

fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| compare_values(x, y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            let (x, y) = (as_f64(a), as_f64(b));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => match (as_decimal(a), as_decimal(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        },
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

/// Running total kept in the narrowest exact representation.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Decimal(Decimal),
    Float(f64),
}

impl Number {
    fn add(self, other: Number, column: &str) -> TabularResult<Number> {
        let overflow = || TabularError::Arithmetic {
            column: column.to_string(),
            reason: "estouro numérico",
        };
        Ok(match (self, other) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a.checked_add(b).ok_or_else(overflow)?),
            (a, b) => Number::Decimal(
                a.to_decimal()
                    .checked_add(b.to_decimal())
                    .ok_or_else(overflow)?,
            ),
        })
    }

    fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            Number::Float(f) => f,
        }
    }

    fn to_decimal(self) -> Decimal {
        match self {
            Number::Int(i) => Decimal::from(i),
            Number::Decimal(d) => d,
            Number::Float(f) => Decimal::from_f64_retain(f).unwrap_or_default(),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(i) => Value::Int(i),
            Number::Decimal(d) => Value::Decimal(d),
            Number::Float(f) => Value::Float(f),
        }
    }
}

/// Integers and decimals are summed exactly as they arrive. Floats are
/// summed at the end in sorted order, so the result does not depend on row
/// order.
#[derive(Debug, Default)]
struct Accumulator {
    count: i64,
    exact: Option<Number>,
    floats: Vec<f64>,
}

impl Accumulator {
    fn push(&mut self, value: &Value, aggregation: Aggregation, column: &str) -> TabularResult<()> {
        if value.is_null() {
            return Ok(());
        }
        self.count += 1;
        if aggregation == Aggregation::Count {
            return Ok(());
        }

        let number = match value {
            Value::Int(i) => Number::Int(*i),
            Value::Decimal(d) => Number::Decimal(*d),
            Value::Float(f) => {
                self.floats.push(*f);
                return Ok(());
            }
            other => {
                return Err(TabularError::WrongType {
                    column: column.to_string(),
                    found: other.type_name(),
                });
            }
        };
        self.exact = Some(match self.exact {
            Some(total) => total.add(number, column)?,
            None => number,
        });
        Ok(())
    }

    fn total(&self) -> Option<Number> {
        if self.floats.is_empty() {
            return self.exact;
        }
        let mut floats = self.floats.clone();
        floats.sort_by(f64::total_cmp);
        let sum: f64 = floats.iter().sum();
        Some(Number::Float(sum + self.exact.map_or(0.0, Number::to_f64)))
    }

    /// `None` when every value in the cell was null.
    fn finish(&self, aggregation: Aggregation, column: &str) -> TabularResult<Option<Value>> {
        if self.count == 0 {
            return Ok(None);
        }
        let Some(total) = self.total() else {
            return Ok(Some(Value::Int(self.count)));
        };

        let value = match aggregation {
            Aggregation::Count => Value::Int(self.count),
            Aggregation::Sum => total.into_value(),
            Aggregation::Mean => match total {
                Number::Int(i) => Value::Float(i as f64 / self.count as f64),
                Number::Float(f) => Value::Float(f / self.count as f64),
                Number::Decimal(d) => Value::Decimal(
                    d.checked_div(Decimal::from(self.count)).ok_or_else(|| {
                        TabularError::Arithmetic {
                            column: column.to_string(),
                            reason: "divisão por zero",
                        }
                    })?,
                ),
            },
        };
        Ok(Some(value))
    }
}
