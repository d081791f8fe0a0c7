//! Expression rendering.

use std::collections::HashMap;

use super::QueryBuilder;
use crate::error::{BuildError, Result};
use crate::expression::{CaseExpression, Expression, FunctionKind, MultiOperandFunction, Operand, Value};
use crate::param::{Param, ParamKey, Params};
use crate::scanner::PlaceholderScanner;

impl QueryBuilder {
    /// Renders an expression, binding its values into `params`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidArgument`] for a CASE without WHEN or a
    /// multi-operand function without operands.
    pub fn build_expression(&self, expr: &Expression, params: &mut Params) -> Result<String> {
        match expr {
            Expression::Raw { sql, params: own } => Ok(self.merge_fragment(sql, own, params)),
            Expression::Param(param) => Ok(params.bind(param.clone())),
            Expression::Case(case) => self.build_case(case, params),
            Expression::Function(function) => self.build_function(function, params),
            Expression::Length(operand) => {
                Ok(format!("LENGTH({})", self.build_operand(operand, params)?))
            }
            Expression::Condition(condition) => self.build_condition(condition, params),
            Expression::Query(query) => Ok(format!("({})", self.build(query, params)?)),
            Expression::Custom(custom) => custom.build(self, params),
        }
    }

    /// Renders a value: scalars are bound, expressions are built in place.
    ///
    /// # Errors
    ///
    /// Propagates errors from nested expressions.
    pub fn build_value(&self, value: &Value, params: &mut Params) -> Result<String> {
        match value {
            Value::Scalar(v) => Ok(params.bind(Param::inferred(v.clone()))),
            Value::Expr(expr) => self.build_expression(expr, params),
        }
    }

    /// Renders an operand: a column is quoted, a value goes through
    /// [`QueryBuilder::build_value`].
    ///
    /// # Errors
    ///
    /// Propagates errors from nested expressions.
    pub fn build_operand(&self, operand: &Operand, params: &mut Params) -> Result<String> {
        match operand {
            Operand::Column(column) => Ok(self.quote_column(column)),
            Operand::Value(value) => self.build_value(value, params),
        }
    }

    fn build_case(&self, case: &CaseExpression, params: &mut Params) -> Result<String> {
        if case.whens().is_empty() {
            return Err(BuildError::invalid(
                "CASE expression must have at least one WHEN clause",
            ));
        }
        let mut sql = String::from("CASE");
        if let Some(subject) = case.case_subject() {
            sql.push(' ');
            sql.push_str(&self.build_expression(subject, params)?);
        }
        for (condition, result) in case.whens() {
            let condition = match condition {
                Value::Scalar(v) => match self.dialect().literal(v) {
                    Some(literal) => literal,
                    None => params.bind(Param::inferred(v.clone())),
                },
                Value::Expr(expr) => self.build_expression(expr, params)?,
            };
            let result = self.build_value(result, params)?;
            sql.push_str(&format!(" WHEN {condition} THEN {result}"));
        }
        if let Some(otherwise) = case.else_result() {
            sql.push_str(&format!(" ELSE {}", self.build_value(otherwise, params)?));
        }
        sql.push_str(" END");
        Ok(sql)
    }

    fn build_function(&self, function: &MultiOperandFunction, params: &mut Params) -> Result<String> {
        let (greatest, least) = self.dialect().greatest_least();
        let name = match function.kind {
            FunctionKind::Greatest => greatest,
            FunctionKind::Least => least,
            FunctionKind::Longest => "LONGEST",
            FunctionKind::Shortest => "SHORTEST",
        };
        if function.operands.is_empty() {
            return Err(BuildError::invalid(format!(
                "{name} requires at least one operand"
            )));
        }
        let operands = function
            .operands
            .iter()
            .map(|op| self.build_operand(op, params))
            .collect::<Result<Vec<_>>>()?;
        if let [single] = operands.as_slice() {
            return Ok(format!("({single})"));
        }
        match function.kind {
            FunctionKind::Greatest | FunctionKind::Least => {
                Ok(format!("{name}({})", operands.join(", ")))
            }
            FunctionKind::Longest | FunctionKind::Shortest => {
                let direction = if function.kind == FunctionKind::Longest {
                    "DESC"
                } else {
                    "ASC"
                };
                let union = operands
                    .iter()
                    .map(|op| format!("SELECT {op} AS value"))
                    .collect::<Vec<_>>()
                    .join(" UNION ");
                Ok(format!(
                    "(SELECT value FROM ({union}) AS t ORDER BY LENGTH(value) {direction} LIMIT 1)"
                ))
            }
        }
    }

    /// Merges a raw fragment's own parameters into `params`.
    ///
    /// Positional `?` markers are rebound under generated names. A named
    /// marker whose name is already bound to a different value is renamed,
    /// so nested fragments never clobber each other.
    fn merge_fragment(&self, sql: &str, own: &Params, params: &mut Params) -> String {
        if own.is_empty() {
            return String::from(sql);
        }
        let mut out = String::with_capacity(sql.len());
        let mut last = 0;
        let mut position = 0_usize;
        let mut renamed: HashMap<&str, String> = HashMap::new();
        let scanner =
            PlaceholderScanner::new(sql).dollar_quoting(self.dialect().supports_dollar_quoting());
        for placeholder in scanner {
            let replacement = if placeholder.is_positional() {
                let Some(param) = own.get(position) else {
                    continue;
                };
                position += 1;
                params.bind(param.clone())
            } else if let Some(name) = renamed.get(placeholder.text) {
                name.clone()
            } else {
                let Some(param) = own.get(placeholder.text) else {
                    continue;
                };
                let key = ParamKey::named(placeholder.text);
                match params.get(key.clone()) {
                    None => {
                        params.insert(key, param.clone());
                        continue;
                    }
                    Some(existing) if existing == param => continue,
                    Some(_) => {
                        let name = params.bind(param.clone());
                        renamed.insert(placeholder.text, name.clone());
                        name
                    }
                }
            };
            out.push_str(&sql[last..placeholder.offset]);
            out.push_str(&replacement);
            last = placeholder.end();
        }
        out.push_str(&sql[last..]);
        for (key, param) in own.iter() {
            if matches!(key, ParamKey::Named(_)) && params.get(key.clone()).is_none() {
                params.insert(key.clone(), param.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dialect::{GenericDialect, SqliteDialect};
    use crate::param::{ParamType, SqlValue};

    fn qb() -> QueryBuilder {
        QueryBuilder::new(Arc::new(GenericDialect::new()))
    }

    #[test]
    fn test_case_expression() {
        let case = CaseExpression::new()
            .subject("expression")
            .when(1, "a")
            .when(2, Expression::raw("1 + 2"))
            .otherwise("c");
        let mut params = Params::new();
        let sql = qb()
            .build_expression(&case.into(), &mut params)
            .unwrap();
        assert_eq!(
            sql,
            "CASE expression WHEN 1 THEN :qp0 WHEN 2 THEN 1 + 2 ELSE :qp1 END"
        );
        assert_eq!(
            params.get(":qp0"),
            Some(&Param::new("a", ParamType::String))
        );
        assert_eq!(
            params.get(":qp1"),
            Some(&Param::new("c", ParamType::String))
        );
    }

    #[test]
    fn test_case_without_when_fails_before_binding() {
        let case = CaseExpression::new().otherwise("c");
        let mut params = Params::new();
        let err = qb().build_expression(&case.into(), &mut params).unwrap_err();
        assert!(matches!(err, BuildError::InvalidArgument(_)));
        assert!(params.is_empty());
    }

    #[test]
    fn test_greatest_and_least() {
        let mut params = Params::new();
        let sql = qb()
            .build_expression(
                &Expression::greatest([Operand::from("a"), Operand::value(10)]),
                &mut params,
            )
            .unwrap();
        assert_eq!(sql, "GREATEST(\"a\", :qp0)");
        assert_eq!(params.get(":qp0").map(Param::value), Some(&SqlValue::Int(10)));

        let sqlite = QueryBuilder::new(Arc::new(SqliteDialect::new()));
        let sql = sqlite
            .build_expression(&Expression::least(["a", "b"]), &mut Params::new())
            .unwrap();
        assert_eq!(sql, "MIN(\"a\", \"b\")");
    }

    #[test]
    fn test_multi_operand_degeneracy() {
        for expr in [
            Expression::greatest(["a"]),
            Expression::least(["a"]),
            Expression::longest(["a"]),
            Expression::shortest(["a"]),
        ] {
            assert_eq!(
                qb().build_expression(&expr, &mut Params::new()).unwrap(),
                "(\"a\")"
            );
        }
        for expr in [
            Expression::greatest(Vec::<Operand>::new()),
            Expression::longest(Vec::<Operand>::new()),
        ] {
            assert!(matches!(
                qb().build_expression(&expr, &mut Params::new()),
                Err(BuildError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_longest_and_shortest() {
        let sql = qb()
            .build_expression(&Expression::longest(["a", "b"]), &mut Params::new())
            .unwrap();
        assert_eq!(
            sql,
            "(SELECT value FROM (SELECT \"a\" AS value UNION SELECT \"b\" AS value) AS t \
             ORDER BY LENGTH(value) DESC LIMIT 1)"
        );
        let sql = qb()
            .build_expression(&Expression::shortest(["a", "b"]), &mut Params::new())
            .unwrap();
        assert!(sql.ends_with("ORDER BY LENGTH(value) ASC LIMIT 1)"));
    }

    #[test]
    fn test_length() {
        let mut params = Params::new();
        assert_eq!(
            qb().build_expression(&Expression::length("name"), &mut params)
                .unwrap(),
            "LENGTH(\"name\")"
        );
        assert_eq!(
            qb().build_expression(&Expression::length(Operand::value("abc")), &mut params)
                .unwrap(),
            "LENGTH(:qp0)"
        );
    }

    #[test]
    fn test_raw_fragment_param_conflict_is_renamed() {
        let mut params = Params::new();
        params.insert(":id", Param::inferred(1_i64));
        let mut own = Params::new();
        own.insert(":id", Param::inferred(2_i64));
        let expr = Expression::raw_with_params("a = :id OR b = :id", own);
        let sql = qb().build_expression(&expr, &mut params).unwrap();
        assert_eq!(sql, "a = :qp1 OR b = :qp1");
        assert_eq!(params.get(":id").map(Param::value), Some(&SqlValue::Int(1)));
        assert_eq!(params.get(":qp1").map(Param::value), Some(&SqlValue::Int(2)));
    }

    #[test]
    fn test_raw_fragment_positional_params_are_named() {
        let mut params = Params::new();
        let expr = Expression::raw_with_params("x BETWEEN ? AND ?", Params::positional([1_i64, 5]));
        let sql = qb().build_expression(&expr, &mut params).unwrap();
        assert_eq!(sql, "x BETWEEN :qp0 AND :qp1");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_explicit_param_type_is_kept() {
        let mut params = Params::new();
        let expr = Expression::Param(Param::new("42", ParamType::Integer));
        assert_eq!(qb().build_expression(&expr, &mut params).unwrap(), ":qp0");
        assert_eq!(params.get(":qp0").map(Param::ty), Some(ParamType::Integer));
    }
}
