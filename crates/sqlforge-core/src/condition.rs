//! Condition trees for WHERE, HAVING and JOIN ... ON clauses.
//!
//! Conditions are plain data. Rendering lives in the builder; the only
//! transform defined here is [`Condition::filtered`], which drops leaves
//! whose value was "not given".

use indexmap::IndexMap;

use crate::expression::{Expression, Value};
use crate::param::{LobStream, SqlValue, ToSqlValue};
use crate::query::Query;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`.
    Eq,
    /// `<>`.
    NotEq,
    /// `>`.
    Gt,
    /// `>=`.
    Gte,
    /// `<`.
    Lt,
    /// `<=`.
    Lte,
}

impl CompareOp {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// How multiple LIKE patterns are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    /// Any pattern matches.
    #[default]
    Or,
    /// Every pattern matches.
    And,
}

impl Conjunction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
        }
    }
}

/// The right-hand side of a hash or IN condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// A single value.
    Value(Value),
    /// A list of values.
    List(Vec<Value>),
    /// A sub-query.
    Query(Box<Query>),
}

impl ConditionValue {
    /// Builds a list from anything convertible to values.
    pub fn list(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// Drops blank entries. Returns `None` if nothing is left.
    fn filtered(&self) -> Option<Self> {
        match self {
            Self::Value(v) if v.is_blank() => None,
            Self::List(items) => {
                let kept: Vec<Value> = items.iter().filter(|v| !v.is_blank()).cloned().collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(Self::List(kept))
                }
            }
            other => Some(other.clone()),
        }
    }
}

macro_rules! scalar_into_condition_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ConditionValue {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::Scalar(value.to_sql_value()))
                }
            }
        )*
    };
}

scalar_into_condition_value!(
    SqlValue, bool, i64, i32, i16, i8, u32, u16, u8, f64, f32, String, &str, LobStream
);

impl<T: ToSqlValue> From<Option<T>> for ConditionValue {
    fn from(value: Option<T>) -> Self {
        Self::Value(Value::Scalar(value.to_sql_value()))
    }
}

impl From<Value> for ConditionValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Expression> for ConditionValue {
    fn from(expr: Expression) -> Self {
        Self::Value(Value::Expr(expr))
    }
}

impl From<Vec<Value>> for ConditionValue {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl From<Query> for ConditionValue {
    fn from(query: Query) -> Self {
        Self::Query(Box::new(query))
    }
}

/// A condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value` pairs joined with AND. NULL renders `IS NULL`, a list
    /// or sub-query renders `IN`.
    Hash(IndexMap<String, ConditionValue>),
    /// All children hold.
    And(Vec<Condition>),
    /// Any child holds.
    Or(Vec<Condition>),
    /// The child does not hold.
    Not(Box<Condition>),
    /// `column <op> value`.
    Compare {
        /// Column name.
        column: String,
        /// Operator.
        op: CompareOp,
        /// Right-hand side.
        value: Value,
    },
    /// `column [NOT] BETWEEN low AND high`.
    Between {
        /// Column name.
        column: String,
        /// Lower bound.
        low: Value,
        /// Upper bound.
        high: Value,
        /// NOT BETWEEN.
        negated: bool,
    },
    /// `column [NOT] IN (...)`. Several columns need a sub-query.
    In {
        /// Column names.
        columns: Vec<String>,
        /// Values or sub-query.
        values: ConditionValue,
        /// NOT IN.
        negated: bool,
    },
    /// `column [NOT] LIKE pattern`, once per pattern.
    Like {
        /// Column name.
        column: String,
        /// Patterns.
        patterns: Vec<Value>,
        /// NOT LIKE.
        negated: bool,
        /// How several patterns combine.
        conjunction: Conjunction,
        /// Whether `%`, `_` and `\` in text patterns are escaped.
        escape: bool,
    },
    /// `[NOT] EXISTS (sub-query)`.
    Exists {
        /// The sub-query.
        query: Box<Query>,
        /// NOT EXISTS.
        negated: bool,
    },
    /// An arbitrary expression.
    Expr(Expression),
}

impl Condition {
    /// Hash condition from `(column, value)` pairs.
    pub fn hash<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ConditionValue>,
    {
        Self::Hash(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Hash condition on a single column.
    pub fn eq(column: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        Self::hash([(column.into(), value.into())])
    }

    /// `column <op> value`.
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `column <> value`.
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::NotEq, value)
    }

    /// `column > value`.
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    /// `column >= value`.
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gte, value)
    }

    /// `column < value`.
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    /// `column <= value`.
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lte, value)
    }

    /// AND of the given conditions.
    pub fn and(children: impl IntoIterator<Item = Self>) -> Self {
        Self::And(children.into_iter().collect())
    }

    /// OR of the given conditions.
    pub fn or(children: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(children.into_iter().collect())
    }

    /// Negation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Self) -> Self {
        Self::Not(Box::new(child))
    }

    /// `column BETWEEN low AND high`.
    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: false,
        }
    }

    /// `column NOT BETWEEN low AND high`.
    pub fn not_between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: true,
        }
    }

    /// `column IN (values...)`.
    pub fn in_list(
        column: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self::In {
            columns: vec![column.into()],
            values: ConditionValue::list(values),
            negated: false,
        }
    }

    /// `column NOT IN (values...)`.
    pub fn not_in(
        column: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self::In {
            columns: vec![column.into()],
            values: ConditionValue::list(values),
            negated: true,
        }
    }

    /// `(a, b, ...) IN (sub-query)`.
    pub fn in_query(columns: impl IntoIterator<Item = impl Into<String>>, query: Query) -> Self {
        Self::In {
            columns: columns.into_iter().map(Into::into).collect(),
            values: ConditionValue::Query(Box::new(query)),
            negated: false,
        }
    }

    /// `column LIKE pattern`. `%`, `_` and `\` inside a text pattern are
    /// escaped, so wrap wildcards yourself with [`Condition::like_raw`].
    pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::like_any(column, [pattern])
    }

    /// `column LIKE pattern` with wildcards kept as written.
    pub fn like_raw(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::Like {
            column: column.into(),
            patterns: vec![pattern.into()],
            negated: false,
            conjunction: Conjunction::Or,
            escape: false,
        }
    }

    /// `column LIKE p1 OR column LIKE p2 ...`.
    pub fn like_any(
        column: impl Into<String>,
        patterns: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self::Like {
            column: column.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            negated: false,
            conjunction: Conjunction::Or,
            escape: true,
        }
    }

    /// `column NOT LIKE p1 AND column NOT LIKE p2 ...`.
    pub fn not_like(
        column: impl Into<String>,
        patterns: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self::Like {
            column: column.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            negated: true,
            conjunction: Conjunction::And,
            escape: true,
        }
    }

    /// `EXISTS (sub-query)`.
    pub fn exists(query: Query) -> Self {
        Self::Exists {
            query: Box::new(query),
            negated: false,
        }
    }

    /// `NOT EXISTS (sub-query)`.
    pub fn not_exists(query: Query) -> Self {
        Self::Exists {
            query: Box::new(query),
            negated: true,
        }
    }

    /// Raw SQL condition.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Expr(Expression::raw(sql))
    }

    /// Returns a copy with every leaf whose value is NULL, blank text or an
    /// empty list removed.
    ///
    /// Branches left without children disappear too; `None` means no clause
    /// should be rendered at all.
    #[must_use]
    pub fn filtered(&self) -> Option<Self> {
        match self {
            Self::Hash(pairs) => {
                let kept: IndexMap<String, ConditionValue> = pairs
                    .iter()
                    .filter_map(|(k, v)| v.filtered().map(|v| (k.clone(), v)))
                    .collect();
                (!kept.is_empty()).then_some(Self::Hash(kept))
            }
            Self::And(children) => filter_children(children).map(Self::And),
            Self::Or(children) => filter_children(children).map(Self::Or),
            Self::Not(child) => child.filtered().map(|c| Self::Not(Box::new(c))),
            Self::Compare { value, .. } if value.is_blank() => None,
            Self::Between { low, high, .. } if low.is_blank() || high.is_blank() => None,
            Self::In {
                columns,
                values,
                negated,
            } => values.filtered().map(|values| Self::In {
                columns: columns.clone(),
                values,
                negated: *negated,
            }),
            Self::Like {
                column,
                patterns,
                negated,
                conjunction,
                escape,
            } => {
                let kept: Vec<Value> = patterns.iter().filter(|p| !p.is_blank()).cloned().collect();
                (!kept.is_empty()).then(|| Self::Like {
                    column: column.clone(),
                    patterns: kept,
                    negated: *negated,
                    conjunction: *conjunction,
                    escape: *escape,
                })
            }
            other => Some(other.clone()),
        }
    }
}

fn filter_children(children: &[Condition]) -> Option<Vec<Condition>> {
    let kept: Vec<Condition> = children.iter().filter_map(Condition::filtered).collect();
    (!kept.is_empty()).then_some(kept)
}
