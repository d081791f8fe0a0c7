//! Column definitions used by the DDL builders.
//!
//! A column type is either a raw type string passed through verbatim
//! (`"VARCHAR(64) NOT NULL"`) or a [`ColumnDefinition`] assembled with the
//! fluent [`ColumnBuilder`] and rendered by the active dialect.

mod types;

pub use types::{DataType, TypeNames};

use crate::param::SqlValue;

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A literal, rendered through the dialect's literal quoting.
    Value(SqlValue),
    /// Raw SQL expression (e.g., CURRENT_TIMESTAMP).
    Expression(String),
}

/// A column definition without its name.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Data type.
    pub data_type: DataType,
    /// Whether the column is nullable.
    pub nullable: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Whether this is a primary key.
    pub primary_key: bool,
    /// Whether this column is unique.
    pub unique: bool,
    /// Whether this column auto-increments.
    pub autoincrement: bool,
    /// Check constraint expression, if any.
    pub check: Option<String>,
    /// Trailing raw SQL appended after the constraints.
    pub append: Option<String>,
}

/// The type part of a column in CREATE TABLE / ADD COLUMN / ALTER COLUMN.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    /// Raw SQL passed through unchanged.
    Raw(String),
    /// A structured definition rendered by the dialect.
    Defined(ColumnDefinition),
}

impl From<&str> for ColumnType {
    fn from(sql: &str) -> Self {
        Self::Raw(String::from(sql))
    }
}

impl From<String> for ColumnType {
    fn from(sql: String) -> Self {
        Self::Raw(sql)
    }
}

impl From<ColumnBuilder> for ColumnType {
    fn from(builder: ColumnBuilder) -> Self {
        Self::Defined(builder.build())
    }
}

impl From<ColumnDefinition> for ColumnType {
    fn from(def: ColumnDefinition) -> Self {
        Self::Defined(def)
    }
}

/// Fluent builder for [`ColumnDefinition`].
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    def: ColumnDefinition,
}

impl ColumnBuilder {
    /// Creates a new nullable column of the given type.
    #[must_use]
    pub fn new(data_type: DataType) -> Self {
        Self {
            def: ColumnDefinition {
                data_type,
                nullable: true,
                default: None,
                primary_key: false,
                unique: false,
                autoincrement: false,
                check: None,
                append: None,
            },
        }
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.def.nullable = false;
        self
    }

    /// Marks the column as PRIMARY KEY.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.def.primary_key = true;
        self.def.nullable = false; // Primary keys are implicitly NOT NULL
        self
    }

    /// Marks the column as UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.def.unique = true;
        self
    }

    /// Marks the column as auto-incrementing.
    #[must_use]
    pub fn autoincrement(mut self) -> Self {
        self.def.autoincrement = true;
        self
    }

    /// Sets a literal default value.
    #[must_use]
    pub fn default_value(mut self, value: impl crate::param::ToSqlValue) -> Self {
        self.def.default = Some(DefaultValue::Value(value.to_sql_value()));
        self
    }

    /// Sets a raw SQL expression as default (e.g., CURRENT_TIMESTAMP).
    #[must_use]
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.def.default = Some(DefaultValue::Expression(expr.into()));
        self
    }

    /// Adds a CHECK constraint.
    #[must_use]
    pub fn check(mut self, expr: impl Into<String>) -> Self {
        self.def.check = Some(expr.into());
        self
    }

    /// Appends raw SQL after the generated constraints.
    #[must_use]
    pub fn append(mut self, sql: impl Into<String>) -> Self {
        self.def.append = Some(sql.into());
        self
    }

    /// Builds the column definition.
    #[must_use]
    pub fn build(self) -> ColumnDefinition {
        self.def
    }
}

/// Auto-incrementing integer primary key.
#[must_use]
pub fn primary_key() -> ColumnBuilder {
    ColumnBuilder::new(DataType::Integer)
        .primary_key()
        .autoincrement()
}

/// Creates an INTEGER column builder.
#[must_use]
pub fn integer() -> ColumnBuilder {
    ColumnBuilder::new(DataType::Integer)
}

/// Creates a SMALLINT column builder.
#[must_use]
pub fn smallint() -> ColumnBuilder {
    ColumnBuilder::new(DataType::Smallint)
}

/// Creates a BIGINT column builder.
#[must_use]
pub fn bigint() -> ColumnBuilder {
    ColumnBuilder::new(DataType::Bigint)
}

/// Creates a DOUBLE column builder.
#[must_use]
pub fn double() -> ColumnBuilder {
    ColumnBuilder::new(DataType::Double)
}

/// Creates a DECIMAL column builder.
#[must_use]
pub fn decimal(precision: u16, scale: u16) -> ColumnBuilder {
    ColumnBuilder::new(DataType::Decimal {
        precision: Some(precision),
        scale: Some(scale),
    })
}

/// Creates a VARCHAR column builder.
#[must_use]
pub fn varchar(len: u32) -> ColumnBuilder {
    ColumnBuilder::new(DataType::Varchar(Some(len)))
}

/// Creates a TEXT column builder.
#[must_use]
pub fn text() -> ColumnBuilder {
    ColumnBuilder::new(DataType::Text)
}

/// Creates a BLOB column builder.
#[must_use]
pub fn blob() -> ColumnBuilder {
    ColumnBuilder::new(DataType::Blob)
}

/// Creates a TIMESTAMP column builder.
#[must_use]
pub fn timestamp() -> ColumnBuilder {
    ColumnBuilder::new(DataType::Timestamp)
}

/// Creates a BOOLEAN column builder.
#[must_use]
pub fn boolean() -> ColumnBuilder {
    ColumnBuilder::new(DataType::Boolean)
}
