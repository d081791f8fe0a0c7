//! Prepared statements: SQL rewritten to `?` markers plus bound values.

use std::collections::HashMap;

use sqlforge_core::{Param, ParamKey, ParamType, PlaceholderScanner, SqlValue};

use crate::error::{Result, SqliteError};

/// A statement ready to run on a SQLite connection.
///
/// `:name` and `?` markers are both rewritten to `?`; each marker keeps
/// the key its value is looked up under, so a name used twice binds twice.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteStatement {
    sql: String,
    slots: Vec<ParamKey>,
    values: HashMap<ParamKey, SqlValue>,
}

impl SqliteStatement {
    /// Rewrites `sql` for SQLite.
    #[must_use]
    pub fn new(sql: &str) -> Self {
        let mut rewritten = String::with_capacity(sql.len());
        let mut slots = Vec::new();
        let mut last = 0;
        let mut position = 0;
        for placeholder in PlaceholderScanner::new(sql) {
            rewritten.push_str(&sql[last..placeholder.offset]);
            rewritten.push('?');
            last = placeholder.end();
            if placeholder.is_positional() {
                slots.push(ParamKey::Positional(position));
                position += 1;
            } else {
                slots.push(ParamKey::named(placeholder.text));
            }
        }
        rewritten.push_str(&sql[last..]);
        Self {
            sql: rewritten,
            slots,
            values: HashMap::new(),
        }
    }

    /// The rewritten SQL.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Keys in marker order.
    #[must_use]
    pub fn slots(&self) -> &[ParamKey] {
        &self.slots
    }

    /// Stores the value for `key`, converted to what SQLite should receive.
    ///
    /// # Errors
    ///
    /// Returns an IO error if a stream cannot be read.
    pub fn bind(&mut self, key: &ParamKey, param: &Param) -> Result<()> {
        let value = coerce(param)?;
        self.values.insert(key.clone(), value);
        Ok(())
    }

    /// Values in marker order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::MissingParam`] for a marker with no value.
    pub fn ordered_values(&self) -> Result<Vec<&SqlValue>> {
        self.slots
            .iter()
            .map(|key| {
                self.values
                    .get(key)
                    .ok_or_else(|| SqliteError::MissingParam(key.to_string()))
            })
            .collect()
    }
}

/// Applies the type tag: streams are read, integers tagged as strings are
/// bound as text and numeric text tagged as integer is bound as a number.
fn coerce(param: &Param) -> Result<SqlValue> {
    let value = match (param.value(), param.ty()) {
        (_, ParamType::Null) => SqlValue::Null,
        (SqlValue::Stream(stream), _) => SqlValue::Blob(stream.drain()?),
        (SqlValue::Int(n), ParamType::String) => SqlValue::Text(n.to_string()),
        (SqlValue::Text(s), ParamType::Integer) => s
            .parse()
            .map_or_else(|_| SqlValue::Text(s.clone()), SqlValue::Int),
        (SqlValue::Bool(b), ParamType::Integer) => SqlValue::Int(i64::from(*b)),
        (value, _) => value.clone(),
    };
    Ok(value)
}
