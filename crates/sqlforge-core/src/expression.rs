//! Expression trees.
//!
//! An [`Expression`] carries one semantic intent (raw SQL with its own
//! params, a CASE expression, a multi-operand function, ...). Rendering is
//! done by [`QueryBuilder::build_expression`](crate::QueryBuilder::build_expression),
//! which dispatches on the variant. Kinds defined outside this crate plug in
//! through [`BuildExpression`] and [`Expression::Custom`].

use std::fmt;
use std::sync::Arc;

use crate::builder::QueryBuilder;
use crate::condition::Condition;
use crate::error::Result;
use crate::param::{LobStream, Param, Params, SqlValue, ToSqlValue};
use crate::query::Query;

/// A user-defined expression kind.
pub trait BuildExpression: fmt::Debug + Send + Sync {
    /// Renders the expression, binding any values into `params`.
    fn build(&self, builder: &QueryBuilder, params: &mut Params) -> Result<String>;
}

/// A value position: either a scalar bound as a parameter, or an expression
/// rendered in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A scalar.
    Scalar(SqlValue),
    /// A nested expression.
    Expr(Expression),
}

impl Value {
    /// Returns the scalar, if this is one.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&SqlValue> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Expr(_) => None,
        }
    }

    /// Returns true for a NULL scalar.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(SqlValue::Null))
    }

    /// Returns true for NULL and whitespace-only text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.as_scalar().is_some_and(SqlValue::is_blank)
    }
}

macro_rules! scalar_into_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.to_sql_value())
                }
            }
        )*
    };
}

scalar_into_value!(
    SqlValue, bool, i64, i32, i16, i8, u32, u16, u8, f64, f32, String, &str, Vec<u8>, LobStream
);

impl<T: ToSqlValue> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        Self::Scalar(value.to_sql_value())
    }
}

impl From<Expression> for Value {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr)
    }
}

impl From<Param> for Value {
    fn from(param: Param) -> Self {
        Self::Expr(Expression::Param(param))
    }
}

impl From<Query> for Value {
    fn from(query: Query) -> Self {
        Self::Expr(Expression::Query(Box::new(query)))
    }
}

/// An operand of a function: a bare string names a column, anything else is
/// a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A column name, quoted as an identifier.
    Column(String),
    /// A value.
    Value(Value),
}

impl Operand {
    /// Wraps a value operand.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }
}

impl From<&str> for Operand {
    fn from(column: &str) -> Self {
        Self::Column(String::from(column))
    }
}

impl From<String> for Operand {
    fn from(column: String) -> Self {
        Self::Column(column)
    }
}

impl From<Expression> for Operand {
    fn from(expr: Expression) -> Self {
        Self::Value(Value::Expr(expr))
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Functions taking any number of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// `GREATEST(a, b, ...)`.
    Greatest,
    /// `LEAST(a, b, ...)`.
    Least,
    /// The longest string among the operands.
    Longest,
    /// The shortest string among the operands.
    Shortest,
}

/// A multi-operand function call.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiOperandFunction {
    /// Function kind.
    pub kind: FunctionKind,
    /// Operands in call order.
    pub operands: Vec<Operand>,
}

/// `CASE [subject] WHEN .. THEN .. [ELSE ..] END`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaseExpression {
    subject: Option<Expression>,
    whens: Vec<(Value, Value)>,
    otherwise: Option<Value>,
}

impl CaseExpression {
    /// Creates an empty CASE expression.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the subject compared against each WHEN value. A string is used
    /// as raw SQL.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<Expression>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Adds a `WHEN condition THEN result` pair.
    ///
    /// Scalar conditions are inlined as literals; scalar results are bound.
    #[must_use]
    pub fn when(mut self, condition: impl Into<Value>, result: impl Into<Value>) -> Self {
        self.whens.push((condition.into(), result.into()));
        self
    }

    /// Sets the ELSE result.
    #[must_use]
    pub fn otherwise(mut self, result: impl Into<Value>) -> Self {
        self.otherwise = Some(result.into());
        self
    }

    /// Returns the subject.
    #[must_use]
    pub fn case_subject(&self) -> Option<&Expression> {
        self.subject.as_ref()
    }

    /// Returns the WHEN/THEN pairs in order.
    #[must_use]
    pub fn whens(&self) -> &[(Value, Value)] {
        &self.whens
    }

    /// Returns the ELSE result.
    #[must_use]
    pub fn else_result(&self) -> Option<&Value> {
        self.otherwise.as_ref()
    }
}

/// A SQL expression.
#[derive(Debug, Clone)]
pub enum Expression {
    /// Raw SQL with its own parameters.
    Raw {
        /// SQL fragment.
        sql: String,
        /// Parameters referenced by the fragment.
        params: Params,
    },
    /// A single bound parameter with an explicit type.
    Param(Param),
    /// A CASE expression.
    Case(Box<CaseExpression>),
    /// A multi-operand function.
    Function(MultiOperandFunction),
    /// `LENGTH(operand)`.
    Length(Box<Operand>),
    /// A condition used as a boolean expression.
    Condition(Box<Condition>),
    /// A sub-query, rendered in parentheses.
    Query(Box<Query>),
    /// A user-defined kind.
    Custom(Arc<dyn BuildExpression>),
}

impl Expression {
    /// Creates a raw expression without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw {
            sql: sql.into(),
            params: Params::new(),
        }
    }

    /// Creates a raw expression with parameters.
    pub fn raw_with_params(sql: impl Into<String>, params: Params) -> Self {
        Self::Raw {
            sql: sql.into(),
            params,
        }
    }

    fn function(kind: FunctionKind, operands: impl IntoIterator<Item = impl Into<Operand>>) -> Self {
        Self::Function(MultiOperandFunction {
            kind,
            operands: operands.into_iter().map(Into::into).collect(),
        })
    }

    /// `GREATEST(...)`.
    pub fn greatest(operands: impl IntoIterator<Item = impl Into<Operand>>) -> Self {
        Self::function(FunctionKind::Greatest, operands)
    }

    /// `LEAST(...)`.
    pub fn least(operands: impl IntoIterator<Item = impl Into<Operand>>) -> Self {
        Self::function(FunctionKind::Least, operands)
    }

    /// The longest operand by `LENGTH`.
    pub fn longest(operands: impl IntoIterator<Item = impl Into<Operand>>) -> Self {
        Self::function(FunctionKind::Longest, operands)
    }

    /// The shortest operand by `LENGTH`.
    pub fn shortest(operands: impl IntoIterator<Item = impl Into<Operand>>) -> Self {
        Self::function(FunctionKind::Shortest, operands)
    }

    /// `LENGTH(operand)`.
    pub fn length(operand: impl Into<Operand>) -> Self {
        Self::Length(Box::new(operand.into()))
    }

    /// Wraps a user-defined expression kind.
    pub fn custom(expr: impl BuildExpression + 'static) -> Self {
        Self::Custom(Arc::new(expr))
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Raw { sql, params },
                Self::Raw {
                    sql: other_sql,
                    params: other_params,
                },
            ) => sql == other_sql && params == other_params,
            (Self::Param(a), Self::Param(b)) => a == b,
            (Self::Case(a), Self::Case(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a == b,
            (Self::Length(a), Self::Length(b)) => a == b,
            (Self::Condition(a), Self::Condition(b)) => a == b,
            (Self::Query(a), Self::Query(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Expression {
    fn from(sql: &str) -> Self {
        Self::raw(sql)
    }
}

impl From<String> for Expression {
    fn from(sql: String) -> Self {
        Self::raw(sql)
    }
}

impl From<CaseExpression> for Expression {
    fn from(case: CaseExpression) -> Self {
        Self::Case(Box::new(case))
    }
}

impl From<Condition> for Expression {
    fn from(condition: Condition) -> Self {
        Self::Condition(Box::new(condition))
    }
}

impl From<Query> for Expression {
    fn from(query: Query) -> Self {
        Self::Query(Box::new(query))
    }
}
