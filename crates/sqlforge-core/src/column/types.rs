//! Column data types and how each dialect spells them.

use core::fmt;

/// Data types the column builder shorthands produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// 2-byte integer.
    Smallint,
    /// 4-byte integer.
    Integer,
    /// 8-byte integer.
    Bigint,
    /// 8-byte float.
    Double,
    /// Exact numeric with optional precision and scale.
    Decimal {
        /// Total number of digits.
        precision: Option<u16>,
        /// Digits after the decimal point.
        scale: Option<u16>,
    },
    /// Variable-length string, optionally bounded.
    Varchar(Option<u32>),
    /// Unbounded string.
    Text,
    /// Binary data.
    Blob,
    /// Date and time.
    Timestamp,
    /// True or false.
    Boolean,
    /// Any other type, rendered verbatim.
    Custom(String),
}

/// Per-dialect names for the types whose spelling is not portable.
///
/// With `storage_classes` set, numeric and string types collapse to the
/// SQLite affinities `INTEGER`, `REAL` and `TEXT`, dropping widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeNames {
    /// Spelling of [`DataType::Double`].
    pub double: &'static str,
    /// Spelling of [`DataType::Blob`].
    pub blob: &'static str,
    /// Spelling of [`DataType::Timestamp`].
    pub timestamp: &'static str,
    /// Spelling of [`DataType::Boolean`].
    pub boolean: &'static str,
    /// Whether only storage classes are spelled.
    pub storage_classes: bool,
}

impl TypeNames {
    /// Standard SQL spellings.
    pub const ANSI: Self = Self {
        double: "DOUBLE",
        blob: "BLOB",
        timestamp: "TIMESTAMP",
        boolean: "BOOLEAN",
        storage_classes: false,
    };
}

impl Default for TypeNames {
    fn default() -> Self {
        Self::ANSI
    }
}

impl DataType {
    /// Renders the type with `names`.
    #[must_use]
    pub fn render(&self, names: &TypeNames) -> String {
        if names.storage_classes {
            let class = match self {
                Self::Smallint | Self::Integer | Self::Bigint | Self::Boolean => Some("INTEGER"),
                Self::Double | Self::Decimal { .. } => Some("REAL"),
                Self::Varchar(_) | Self::Text | Self::Timestamp => Some("TEXT"),
                Self::Blob | Self::Custom(_) => None,
            };
            if let Some(class) = class {
                return String::from(class);
            }
        }
        match self {
            Self::Smallint => String::from("SMALLINT"),
            Self::Integer => String::from("INTEGER"),
            Self::Bigint => String::from("BIGINT"),
            Self::Double => String::from(names.double),
            Self::Decimal {
                precision: Some(p),
                scale: Some(s),
            } => format!("DECIMAL({p}, {s})"),
            Self::Decimal {
                precision: Some(p),
                scale: None,
            } => format!("DECIMAL({p})"),
            Self::Decimal { .. } => String::from("DECIMAL"),
            Self::Varchar(Some(n)) => format!("VARCHAR({n})"),
            Self::Varchar(None) => String::from("VARCHAR"),
            Self::Text => String::from("TEXT"),
            Self::Blob => String::from(names.blob),
            Self::Timestamp => String::from(names.timestamp),
            Self::Boolean => String::from(names.boolean),
            Self::Custom(name) => name.clone(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&TypeNames::ANSI))
    }
}
