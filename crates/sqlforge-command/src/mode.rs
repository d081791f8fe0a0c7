//! Query modes and the result shapes they produce.

use std::collections::VecDeque;

use sqlforge_core::SqlValue;

use crate::driver::Row;
use crate::error::Result;

/// What shape of result a statement run should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// Affected-row count.
    Execute,
    /// The first row.
    Row,
    /// Every row.
    All,
    /// The first column of every row.
    Column,
    /// The first column of the first row.
    Scalar,
    /// A reader over every row.
    Cursor,
}

impl QueryMode {
    /// Returns whether the mode reads rows.
    #[must_use]
    pub const fn is_read(self) -> bool {
        !matches!(self, Self::Execute)
    }

    /// Returns whether results of this mode may be served from the query
    /// cache.
    #[must_use]
    pub const fn is_cacheable(self) -> bool {
        matches!(self, Self::Row | Self::All | Self::Column | Self::Scalar)
    }
}

/// A shaped, cacheable query result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// The first row, if any.
    Row(Option<Row>),
    /// Every row.
    All(Vec<Row>),
    /// The first column of every row.
    Column(Vec<SqlValue>),
    /// The first column of the first row, if any.
    Scalar(Option<SqlValue>),
}

impl QueryResult {
    /// Shapes fetched rows for `mode`.
    ///
    /// In scalar mode a stream value is drained into text, so callers never
    /// hold a live handle. Execute and cursor modes keep every row.
    ///
    /// # Errors
    ///
    /// Returns an IO error when draining a stream fails.
    pub fn shape(mode: QueryMode, rows: Vec<Row>) -> Result<Self> {
        let first_column = |row: Row| row.into_iter().next().map(|(_, v)| v);
        let result = match mode {
            QueryMode::Row => Self::Row(rows.into_iter().next()),
            QueryMode::All | QueryMode::Execute | QueryMode::Cursor => Self::All(rows),
            QueryMode::Column => Self::Column(rows.into_iter().filter_map(first_column).collect()),
            QueryMode::Scalar => {
                let value = rows.into_iter().next().and_then(first_column);
                let value = match value {
                    Some(SqlValue::Stream(stream)) => {
                        let bytes = stream.drain()?;
                        Some(SqlValue::Text(String::from_utf8_lossy(&bytes).into_owned()))
                    }
                    other => other,
                };
                Self::Scalar(value)
            }
        };
        Ok(result)
    }

    /// The shape of an empty result for `mode`.
    #[must_use]
    pub fn empty(mode: QueryMode) -> Self {
        match mode {
            QueryMode::Row => Self::Row(None),
            QueryMode::Column => Self::Column(Vec::new()),
            QueryMode::Scalar => Self::Scalar(None),
            QueryMode::All | QueryMode::Execute | QueryMode::Cursor => Self::All(Vec::new()),
        }
    }

    /// The first row.
    #[must_use]
    pub fn into_row(self) -> Option<Row> {
        match self {
            Self::Row(row) => row,
            Self::All(rows) => rows.into_iter().next(),
            Self::Column(_) | Self::Scalar(_) => None,
        }
    }

    /// Every row.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Row(row) => row.into_iter().collect(),
            Self::All(rows) => rows,
            Self::Column(_) | Self::Scalar(_) => Vec::new(),
        }
    }

    /// The column values.
    #[must_use]
    pub fn into_column(self) -> Vec<SqlValue> {
        match self {
            Self::Column(values) => values,
            Self::Scalar(value) => value.into_iter().collect(),
            Self::Row(_) | Self::All(_) => Vec::new(),
        }
    }

    /// The scalar value.
    #[must_use]
    pub fn into_scalar(self) -> Option<SqlValue> {
        match self {
            Self::Scalar(value) => value,
            Self::Column(values) => values.into_iter().next(),
            Self::Row(_) | Self::All(_) => None,
        }
    }
}

/// A forward-only reader over fetched rows.
///
/// Rows are buffered when the reader is created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataReader {
    rows: VecDeque<Row>,
    read: usize,
}

impl DataReader {
    /// Wraps fetched rows.
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into(),
            read: 0,
        }
    }

    /// Advances to the next row.
    pub fn read(&mut self) -> Option<Row> {
        let row = self.rows.pop_front()?;
        self.read += 1;
        Some(row)
    }

    /// Consumes every remaining row.
    #[must_use]
    pub fn read_all(self) -> Vec<Row> {
        self.rows.into()
    }

    /// Number of rows read so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.read
    }

    /// Number of rows left.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Names of the columns, taken from the next row.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.rows
            .front()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Iterator for DataReader {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.read()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.rows.len(), Some(self.rows.len()))
    }
}

#[cfg(test)]
mod tests {
    use sqlforge_core::LobStream;

    use super::*;

    fn row(pairs: &[(&str, SqlValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), v.clone()))
            .collect()
    }

    fn rows() -> Vec<Row> {
        vec![
            row(&[("id", SqlValue::Int(1)), ("name", SqlValue::Text("a".into()))]),
            row(&[("id", SqlValue::Int(2)), ("name", SqlValue::Text("b".into()))]),
        ]
    }

    #[test]
    fn test_modes() {
        assert!(!QueryMode::Execute.is_read());
        assert!(QueryMode::Cursor.is_read());
        assert!(!QueryMode::Cursor.is_cacheable());
        assert!(QueryMode::Scalar.is_cacheable());
    }

    #[test]
    fn test_shape() {
        assert_eq!(
            QueryResult::shape(QueryMode::Column, rows()).unwrap(),
            QueryResult::Column(vec![SqlValue::Int(1), SqlValue::Int(2)])
        );
        assert_eq!(
            QueryResult::shape(QueryMode::Scalar, rows()).unwrap(),
            QueryResult::Scalar(Some(SqlValue::Int(1)))
        );
        assert_eq!(
            QueryResult::shape(QueryMode::Row, Vec::new()).unwrap(),
            QueryResult::empty(QueryMode::Row)
        );
        assert_eq!(
            QueryResult::shape(QueryMode::Cursor, rows()).unwrap(),
            QueryResult::All(rows())
        );
    }

    #[test]
    fn test_scalar_stream_is_drained() {
        let stream = LobStream::new(std::io::Cursor::new(b"payload".to_vec()));
        let result =
            QueryResult::shape(QueryMode::Scalar, vec![row(&[("data", SqlValue::Stream(stream))])])
                .unwrap();
        assert_eq!(
            result,
            QueryResult::Scalar(Some(SqlValue::Text("payload".into())))
        );
    }

    #[test]
    fn test_conversions() {
        let all = QueryResult::All(rows());
        assert_eq!(all.clone().into_row(), rows().into_iter().next());
        assert_eq!(all.into_rows().len(), 2);
        assert_eq!(QueryResult::Row(None).into_rows(), Vec::<Row>::new());
        assert_eq!(
            QueryResult::Scalar(Some(SqlValue::Int(7))).into_scalar(),
            Some(SqlValue::Int(7))
        );
        assert_eq!(QueryResult::empty(QueryMode::Column).into_column(), Vec::new());
    }

    #[test]
    fn test_data_reader() {
        let mut reader = DataReader::new(rows());
        assert_eq!(reader.column_names(), vec!["id", "name"]);
        assert_eq!(reader.read().map(|r| r["id"].clone()), Some(SqlValue::Int(1)));
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.remaining(), 1);
        assert_eq!(reader.read_all().len(), 1);

        let ids: Vec<SqlValue> = DataReader::new(rows()).map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }
}
