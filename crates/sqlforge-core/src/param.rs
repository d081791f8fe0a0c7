//! Bind values and the parameter set exchanged with the execution layer.
//!
//! A [`Param`] pairs a [`SqlValue`] with the [`ParamType`] tag the driver
//! uses when binding it. [`Params`] keeps them in insertion order, keyed by
//! placeholder name (`:qp0`) or by position.

use std::fmt;
use std::io::{self, Read};
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;

/// Prefix used for placeholders generated by the builder.
pub const PARAM_PREFIX: &str = ":qp";

/// A readable binary stream bound as a LOB.
///
/// Clones share the same underlying reader.
#[derive(Clone)]
pub struct LobStream(Arc<Mutex<Box<dyn Read + Send>>>);

impl LobStream {
    /// Wraps a reader.
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(reader))))
    }

    /// Reads the remaining contents of the stream into memory.
    pub fn drain(&self) -> io::Result<Vec<u8>> {
        let mut reader = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for LobStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LobStream(..)")
    }
}

impl PartialEq for LobStream {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A SQL value that can be used as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Binary stream, only readable once.
    Stream(LobStream),
}

impl SqlValue {
    /// Returns true for values a filter condition treats as "not given":
    /// NULL and strings that are empty after trimming.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! int_to_sql_value {
    ($($ty:ty),*) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )*
    };
}

int_to_sql_value!(i64, i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for LobStream {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Stream(self)
    }
}

/// Semantic type tag the driver binds a parameter with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// SQL NULL.
    Null,
    /// Integer.
    Integer,
    /// Character data. Floats are bound as strings too.
    String,
    /// Large object (binary data or stream).
    Lob,
    /// Boolean.
    Boolean,
}

impl ParamType {
    /// Infers the tag from the runtime kind of a value.
    #[must_use]
    pub fn infer(value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => Self::Null,
            SqlValue::Bool(_) => Self::Boolean,
            SqlValue::Int(_) => Self::Integer,
            SqlValue::Blob(_) | SqlValue::Stream(_) => Self::Lob,
            SqlValue::Float(_) | SqlValue::Text(_) => Self::String,
        }
    }
}

/// A single bind value with its type tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    value: SqlValue,
    ty: ParamType,
}

impl Param {
    /// Creates a parameter with an explicit type.
    #[must_use]
    pub fn new(value: impl ToSqlValue, ty: ParamType) -> Self {
        Self {
            value: value.to_sql_value(),
            ty,
        }
    }

    /// Creates a parameter whose type is inferred from the value.
    #[must_use]
    pub fn inferred(value: impl ToSqlValue) -> Self {
        let value = value.to_sql_value();
        let ty = ParamType::infer(&value);
        Self { value, ty }
    }

    /// Returns the value.
    #[must_use]
    pub fn value(&self) -> &SqlValue {
        &self.value
    }

    /// Returns the type tag.
    #[must_use]
    pub fn ty(&self) -> ParamType {
        self.ty
    }
}

/// Key of a bound parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// A named placeholder, always stored with its leading colon.
    Named(String),
    /// A zero-based positional placeholder (`?`).
    Positional(usize),
}

impl ParamKey {
    /// Creates a named key, adding the leading colon when missing.
    #[must_use]
    pub fn named(name: &str) -> Self {
        if name.starts_with(':') {
            Self::Named(String::from(name))
        } else {
            Self::Named(format!(":{name}"))
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Positional(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        Self::named(&name)
    }
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        Self::Positional(index)
    }
}

/// An insertion-ordered set of bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(IndexMap<ParamKey, Param>);

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a positional parameter set (`0, 1, 2, ...`) from values.
    pub fn positional<T: ToSqlValue>(values: impl IntoIterator<Item = T>) -> Self {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (ParamKey::Positional(i), Param::inferred(v)))
            .collect()
    }

    /// Inserts or overwrites one parameter. An overwritten key keeps its
    /// original position.
    pub fn insert(&mut self, key: impl Into<ParamKey>, param: Param) {
        self.0.insert(key.into(), param);
    }

    /// Binds a value under a freshly generated `:qpN` name and returns the
    /// placeholder.
    pub fn bind(&mut self, param: Param) -> String {
        let mut n = self.0.len();
        let name = loop {
            let candidate = format!("{PARAM_PREFIX}{n}");
            if !self.0.contains_key(&ParamKey::Named(candidate.clone())) {
                break candidate;
            }
            n += 1;
        };
        self.0.insert(ParamKey::Named(name.clone()), param);
        name
    }

    /// Appends every parameter of `other`, overwriting equal keys.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Returns the parameter bound under `key`.
    pub fn get(&self, key: impl Into<ParamKey>) -> Option<&Param> {
        self.0.get(&key.into())
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no parameter is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true when every key is positional.
    #[must_use]
    pub fn is_positional(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .keys()
                .all(|k| matches!(k, ParamKey::Positional(_)))
    }

    /// Iterates the parameters in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Param)> {
        self.0.iter()
    }

    /// Removes every parameter.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<(ParamKey, Param)> for Params {
    fn from_iter<I: IntoIterator<Item = (ParamKey, Param)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Params {
    type Item = (ParamKey, Param);
    type IntoIter = indexmap::map::IntoIter<ParamKey, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
