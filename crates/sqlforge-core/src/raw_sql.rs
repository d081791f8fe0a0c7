//! Raw SQL reconstruction for logging.
//!
//! Substitutes bound parameters back into their placeholders. The output is
//! meant for humans and cache keys, not for execution: a parameter with no
//! literal form (a stream) leaves its placeholder in place.

use crate::dialect::Dialect;
use crate::param::{Param, ParamKey, ParamType, Params, SqlValue};
use crate::scanner::PlaceholderScanner;

/// Renders `sql` with every bound parameter replaced by its literal.
///
/// A parameter set whose keys are all positions fills `?` markers in order;
/// otherwise `:name` markers are looked up by name. Unknown placeholders are
/// left untouched.
#[must_use]
pub fn raw_sql(dialect: &dyn Dialect, sql: &str, params: &Params) -> String {
    if params.is_empty() {
        return String::from(sql);
    }
    let positional = params.is_positional();
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    let mut position = 0_usize;
    for placeholder in
        PlaceholderScanner::new(sql).dollar_quoting(dialect.supports_dollar_quoting())
    {
        let param = if placeholder.is_positional() {
            if !positional {
                continue;
            }
            let param = params.get(ParamKey::Positional(position));
            position += 1;
            param
        } else {
            params.get(placeholder.text)
        };
        let Some(literal) = param.and_then(|p| param_literal(dialect, p)) else {
            continue;
        };
        out.push_str(&sql[last..placeholder.offset]);
        out.push_str(&literal);
        last = placeholder.end();
    }
    out.push_str(&sql[last..]);
    out
}

/// The literal a parameter stands for, chosen by its type tag.
fn param_literal(dialect: &dyn Dialect, param: &Param) -> Option<String> {
    let quoted = matches!(param.ty(), ParamType::String | ParamType::Lob);
    let sql = match param.value() {
        SqlValue::Stream(_) => return None,
        _ if param.ty() == ParamType::Null => String::from("NULL"),
        SqlValue::Null => String::from("NULL"),
        SqlValue::Bool(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
        SqlValue::Int(n) if quoted => dialect.quote_value(&n.to_string()),
        SqlValue::Int(n) => n.to_string(),
        SqlValue::Float(f) if quoted => dialect.quote_value(&f.to_string()),
        SqlValue::Float(f) => f.to_string(),
        SqlValue::Text(s) if param.ty() == ParamType::Integer && s.parse::<i64>().is_ok() => {
            s.clone()
        }
        SqlValue::Text(s) => dialect.quote_value(s),
        SqlValue::Blob(bytes) if param.ty() == ParamType::String => {
            dialect.quote_value(&String::from_utf8_lossy(bytes))
        }
        SqlValue::Blob(bytes) => dialect.blob_literal(bytes),
    };
    Some(sql)
}
