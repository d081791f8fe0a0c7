//! Condition rendering.

use super::QueryBuilder;
use crate::condition::{CompareOp, Condition, ConditionValue, Conjunction};
use crate::error::{BuildError, Result};
use crate::expression::{Expression, Value};
use crate::param::{Param, Params, SqlValue};

/// Escapes LIKE wildcards and the escape character itself.
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Joins rendered parts, dropping empty ones: a single part is returned
/// as is, several are each wrapped in parentheses.
fn join_parts(parts: Vec<String>, keyword: &str) -> String {
    let parts: Vec<String> = parts.into_iter().filter(|p| !p.is_empty()).collect();
    match parts.len() {
        0 => String::new(),
        1 => parts.into_iter().next().unwrap_or_default(),
        _ => parts
            .iter()
            .map(|p| format!("({p})"))
            .collect::<Vec<_>>()
            .join(&format!(" {keyword} ")),
    }
}

impl QueryBuilder {
    /// Renders a condition tree. An empty string means "no condition".
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidArgument`] for a multi-column IN over a
    /// value list, and propagates errors from nested expressions.
    pub fn build_condition(&self, condition: &Condition, params: &mut Params) -> Result<String> {
        match condition {
            Condition::Hash(pairs) => {
                let parts = pairs
                    .iter()
                    .map(|(column, value)| self.build_hash_pair(column, value, params))
                    .collect::<Result<Vec<_>>>()?;
                Ok(join_parts(parts, "AND"))
            }
            Condition::And(children) => self.build_conjunction(children, "AND", params),
            Condition::Or(children) => self.build_conjunction(children, "OR", params),
            Condition::Not(child) => {
                let inner = self.build_condition(child, params)?;
                if inner.is_empty() {
                    Ok(inner)
                } else {
                    Ok(format!("NOT ({inner})"))
                }
            }
            Condition::Compare { column, op, value } => {
                self.build_compare(column, *op, value, params)
            }
            Condition::Between {
                column,
                low,
                high,
                negated,
            } => {
                let low = self.build_value(low, params)?;
                let high = self.build_value(high, params)?;
                let op = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                Ok(format!("{} {op} {low} AND {high}", self.quote_column(column)))
            }
            Condition::In {
                columns,
                values,
                negated,
            } => self.build_in(columns, values, *negated, params),
            Condition::Like {
                column,
                patterns,
                negated,
                conjunction,
                escape,
            } => self.build_like(column, patterns, *negated, *conjunction, *escape, params),
            Condition::Exists { query, negated } => {
                let sub = self.build(query, params)?;
                let op = if *negated { "NOT EXISTS" } else { "EXISTS" };
                Ok(format!("{op} ({sub})"))
            }
            Condition::Expr(expr) => self.build_expression(expr, params),
        }
    }

    fn build_conjunction(
        &self,
        children: &[Condition],
        keyword: &str,
        params: &mut Params,
    ) -> Result<String> {
        let parts = children
            .iter()
            .map(|child| self.build_condition(child, params))
            .collect::<Result<Vec<_>>>()?;
        Ok(join_parts(parts, keyword))
    }

    fn build_hash_pair(
        &self,
        column: &str,
        value: &ConditionValue,
        params: &mut Params,
    ) -> Result<String> {
        match value {
            ConditionValue::Value(Value::Scalar(SqlValue::Null)) => {
                Ok(format!("{} IS NULL", self.quote_column(column)))
            }
            ConditionValue::Value(Value::Expr(Expression::Query(query))) => {
                let sub = self.build(query, params)?;
                Ok(format!("{} IN ({sub})", self.quote_column(column)))
            }
            ConditionValue::Value(value) => {
                let value = self.build_value(value, params)?;
                Ok(format!("{} = {value}", self.quote_column(column)))
            }
            other => self.build_in(&[String::from(column)], other, false, params),
        }
    }

    fn build_compare(
        &self,
        column: &str,
        op: CompareOp,
        value: &Value,
        params: &mut Params,
    ) -> Result<String> {
        let column = self.quote_column(column);
        match (op, value) {
            (CompareOp::Eq, Value::Scalar(SqlValue::Null)) => Ok(format!("{column} IS NULL")),
            (CompareOp::NotEq, Value::Scalar(SqlValue::Null)) => {
                Ok(format!("{column} IS NOT NULL"))
            }
            _ => {
                let value = self.build_value(value, params)?;
                Ok(format!("{column} {} {value}", op.as_sql()))
            }
        }
    }

    fn build_in(
        &self,
        columns: &[String],
        values: &ConditionValue,
        negated: bool,
        params: &mut Params,
    ) -> Result<String> {
        if columns.is_empty() {
            return Err(BuildError::invalid("IN condition needs at least one column"));
        }
        match values {
            ConditionValue::Query(query) => {
                let sub = self.build(query, params)?;
                let target = if columns.len() == 1 {
                    self.quote_column(&columns[0])
                } else {
                    format!("({})", self.quote_columns(columns))
                };
                let op = if negated { "NOT IN" } else { "IN" };
                Ok(format!("{target} {op} ({sub})"))
            }
            ConditionValue::Value(value) => {
                self.build_in_list(columns, std::slice::from_ref(value), negated, params)
            }
            ConditionValue::List(items) => self.build_in_list(columns, items, negated, params),
        }
    }

    fn build_in_list(
        &self,
        columns: &[String],
        items: &[Value],
        negated: bool,
        params: &mut Params,
    ) -> Result<String> {
        let [column] = columns else {
            return Err(BuildError::invalid(
                "a multi-column IN condition needs a sub-query",
            ));
        };
        if items.is_empty() {
            // nothing is in an empty set
            return Ok(if negated {
                String::new()
            } else {
                String::from("0=1")
            });
        }
        let column = self.quote_column(column);
        let has_null = items.iter().any(Value::is_null);
        let rendered = items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| self.build_value(v, params))
            .collect::<Result<Vec<_>>>()?;

        let null_check = if negated {
            format!("{column} IS NOT NULL")
        } else {
            format!("{column} IS NULL")
        };
        let sql = match rendered.as_slice() {
            [] => return Ok(null_check),
            [single] => {
                let op = if negated { "<>" } else { "=" };
                format!("{column} {op} {single}")
            }
            many => {
                let op = if negated { "NOT IN" } else { "IN" };
                format!("{column} {op} ({})", many.join(", "))
            }
        };
        Ok(match (has_null, negated) {
            (false, _) => sql,
            (true, false) => format!("{sql} OR {null_check}"),
            (true, true) => format!("{sql} AND {null_check}"),
        })
    }

    fn build_like(
        &self,
        column: &str,
        patterns: &[Value],
        negated: bool,
        conjunction: Conjunction,
        escape: bool,
        params: &mut Params,
    ) -> Result<String> {
        if patterns.is_empty() {
            return Ok(if negated {
                String::new()
            } else {
                String::from("0=1")
            });
        }
        let column = self.quote_column(column);
        let op = if negated { "NOT LIKE" } else { "LIKE" };
        let escape_clause = match (escape, self.dialect().like_escape()) {
            (true, Some(c)) => format!(" ESCAPE {}", self.quote_value(&c.to_string())),
            _ => String::new(),
        };
        let parts = patterns
            .iter()
            .map(|pattern| {
                let placeholder = match pattern {
                    Value::Scalar(SqlValue::Text(text)) if escape => {
                        params.bind(Param::inferred(escape_like(text)))
                    }
                    other => self.build_value(other, params)?,
                };
                Ok(format!("{column} {op} {placeholder}{escape_clause}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(&format!(" {} ", conjunction.as_sql())))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dialect::{GenericDialect, SqliteDialect};
    use crate::query::Query;

    fn build(condition: &Condition) -> (String, Params) {
        let qb = QueryBuilder::new(Arc::new(GenericDialect::new()));
        let mut params = Params::new();
        let sql = qb.build_condition(condition, &mut params).unwrap();
        (sql, params)
    }

    #[test]
    fn test_hash_condition() {
        let (sql, params) = build(&Condition::hash([
            ("status", Value::from(1)),
            ("deleted_at", Value::from(None::<i64>)),
        ]));
        assert_eq!(sql, "(\"status\" = :qp0) AND (\"deleted_at\" IS NULL)");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_hash_list_renders_in() {
        let (sql, _) = build(&Condition::eq("id", ConditionValue::list([1, 2, 3])));
        assert_eq!(sql, "\"id\" IN (:qp0, :qp1, :qp2)");
    }

    #[test]
    fn test_nested_logic() {
        let (sql, params) = build(&Condition::and([
            Condition::eq("a", 1),
            Condition::or([Condition::gt("b", 2), Condition::not(Condition::eq("c", 3))]),
        ]));
        assert_eq!(
            sql,
            "(\"a\" = :qp0) AND ((\"b\" > :qp1) OR (NOT (\"c\" = :qp2)))"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_between() {
        let (sql, _) = build(&Condition::not_between("age", 18, 65));
        assert_eq!(sql, "\"age\" NOT BETWEEN :qp0 AND :qp1");
    }

    #[test]
    fn test_in_edge_cases() {
        assert_eq!(build(&Condition::in_list("id", Vec::<Value>::new())).0, "0=1");
        assert_eq!(build(&Condition::not_in("id", Vec::<Value>::new())).0, "");
        assert_eq!(build(&Condition::in_list("id", [7])).0, "\"id\" = :qp0");
        assert_eq!(build(&Condition::not_in("id", [7])).0, "\"id\" <> :qp0");
        assert_eq!(
            build(&Condition::in_list("id", [Value::from(1), Value::from(None::<i64>), Value::from(2)])).0,
            "\"id\" IN (:qp0, :qp1) OR \"id\" IS NULL"
        );
        assert_eq!(
            build(&Condition::not_in("id", [Value::from(None::<i64>)])).0,
            "\"id\" IS NOT NULL"
        );
    }

    #[test]
    fn test_composite_in_subquery() {
        let sub = Query::new().select(["a", "b"]).from("t");
        let (sql, _) = build(&Condition::in_query(["x", "y"], sub));
        assert_eq!(sql, "(\"x\", \"y\") IN (SELECT \"a\", \"b\" FROM \"t\")");
    }

    #[test]
    fn test_composite_in_list_is_rejected() {
        let qb = QueryBuilder::new(Arc::new(GenericDialect::new()));
        let cond = Condition::In {
            columns: vec!["x".into(), "y".into()],
            values: ConditionValue::list([1, 2]),
            negated: false,
        };
        assert!(matches!(
            qb.build_condition(&cond, &mut Params::new()),
            Err(BuildError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_like_escapes_wildcards() {
        let (sql, params) = build(&Condition::like("name", "50%_off"));
        assert_eq!(sql, "\"name\" LIKE :qp0");
        assert_eq!(
            params.get(":qp0").map(Param::value),
            Some(&SqlValue::Text("50\\%\\_off".into()))
        );
        let (_, params) = build(&Condition::like_raw("name", "%abc%"));
        assert_eq!(
            params.get(":qp0").map(Param::value),
            Some(&SqlValue::Text("%abc%".into()))
        );
    }

    #[test]
    fn test_like_multiple_patterns() {
        let (sql, _) = build(&Condition::like_any("name", ["a", "b"]));
        assert_eq!(sql, "\"name\" LIKE :qp0 OR \"name\" LIKE :qp1");
        let (sql, _) = build(&Condition::not_like("name", ["a", "b"]));
        assert_eq!(sql, "\"name\" NOT LIKE :qp0 AND \"name\" NOT LIKE :qp1");
    }

    #[test]
    fn test_like_escape_clause_for_sqlite() {
        let qb = QueryBuilder::new(Arc::new(SqliteDialect::new()));
        let sql = qb
            .build_condition(&Condition::like("name", "a"), &mut Params::new())
            .unwrap();
        assert_eq!(sql, "\"name\" LIKE :qp0 ESCAPE '\\'");
    }

    #[test]
    fn test_exists_threads_params_in_order() {
        let sub = Query::new()
            .from("order")
            .where_clause(Condition::eq("status", "paid"));
        let (sql, params) = build(&Condition::and([
            Condition::eq("active", true),
            Condition::exists(sub),
            Condition::gt("age", 18),
        ]));
        assert_eq!(
            sql,
            "(\"active\" = :qp0) AND (EXISTS (SELECT * FROM \"order\" WHERE \"status\" = :qp1)) AND (\"age\" > :qp2)"
        );
        let values: Vec<&SqlValue> = params.iter().map(|(_, p)| p.value()).collect();
        assert_eq!(
            values,
            vec![
                &SqlValue::Bool(true),
                &SqlValue::Text("paid".into()),
                &SqlValue::Int(18)
            ]
        );
    }

    #[test]
    fn test_empty_children_are_skipped() {
        let (sql, _) = build(&Condition::and([
            Condition::not_in("id", Vec::<Value>::new()),
            Condition::eq("a", 1),
        ]));
        assert_eq!(sql, "\"a\" = :qp0");
    }

    #[test]
    fn test_compare_null() {
        assert_eq!(
            build(&Condition::ne("a", None::<i64>)).0,
            "\"a\" IS NOT NULL"
        );
    }
}
