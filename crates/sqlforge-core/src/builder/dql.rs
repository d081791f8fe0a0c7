//! SELECT rendering.

use super::{QueryBuilder, Statement};
use crate::error::{BuildError, Result};
use crate::param::Params;
use crate::query::{
    Direction, FromKey, GroupItem, Join, OrderItem, Query, SelectItem, SelectKey, TableSource,
};

impl QueryBuilder {
    /// Renders a query, binding its values into `params`.
    ///
    /// The query's own parameters are merged first, then every clause is
    /// rendered left to right so bound values keep source order.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidArgument`] for a sub-query or expression
    /// used as FROM source without alias, and propagates errors from nested
    /// conditions and expressions.
    pub fn build(&self, query: &Query, params: &mut Params) -> Result<String> {
        params.extend(query.params.clone());

        let with = if query.with.is_empty() {
            None
        } else {
            Some(self.build_with(query, params)?)
        };
        let mut clauses = vec![self.build_select(query, params)?];
        if !query.from.is_empty() {
            clauses.push(format!("FROM {}", self.build_from(query, params)?));
        }
        for join in &query.joins {
            clauses.push(self.build_join(join, params)?);
        }
        if let Some(condition) = &query.where_condition {
            let sql = self.build_condition(condition, params)?;
            if !sql.is_empty() {
                clauses.push(format!("WHERE {sql}"));
            }
        }
        if !query.group_by.is_empty() {
            clauses.push(format!("GROUP BY {}", self.build_group_by(&query.group_by, params)?));
        }
        if let Some(condition) = &query.having {
            let sql = self.build_condition(condition, params)?;
            if !sql.is_empty() {
                clauses.push(format!("HAVING {sql}"));
            }
        }
        if !query.order_by.is_empty() {
            clauses.push(format!("ORDER BY {}", self.build_order_by(&query.order_by, params)?));
        }
        let limit = self.dialect().limit_offset(query.limit, query.offset);
        if !limit.is_empty() {
            clauses.push(limit);
        }

        let mut sql = clauses.join(" ");
        if !query.unions.is_empty() {
            sql = format!("({sql})");
            for union in &query.unions {
                let keyword = if union.all { "UNION ALL" } else { "UNION" };
                let part = self.build(&union.query, params)?;
                sql.push_str(&format!(" {keyword} ({part})"));
            }
        }
        if let Some(with) = with {
            sql = format!("{with} {sql}");
        }
        Ok(sql)
    }

    /// Renders a query into a fresh statement.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::build`].
    pub fn build_query(&self, query: &Query) -> Result<Statement> {
        let mut params = Params::new();
        let sql = self.build(query, &mut params)?;
        Ok(self.statement(&sql, params))
    }

    fn build_select(&self, query: &Query, params: &mut Params) -> Result<String> {
        let keyword = if query.distinct {
            "SELECT DISTINCT"
        } else {
            "SELECT"
        };
        if query.select.is_empty() {
            return Ok(format!("{keyword} *"));
        }
        let columns = query
            .select
            .iter()
            .map(|(key, item)| {
                let sql = match item {
                    SelectItem::Column(column) => self.quote_column(column),
                    SelectItem::Expr(expr) => self.build_expression(expr, params)?,
                };
                Ok(match key {
                    SelectKey::Alias(alias) => {
                        format!("{sql} AS {}", self.dialect().quote_simple_column_name(alias))
                    }
                    SelectKey::Column(_) | SelectKey::Anonymous(_) => sql,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("{keyword} {}", columns.join(", ")))
    }

    fn build_from(&self, query: &Query, params: &mut Params) -> Result<String> {
        let sources = query
            .from
            .iter()
            .map(|(key, source)| {
                let alias = match key {
                    FromKey::Alias(alias) => Some(alias.as_str()),
                    FromKey::Anonymous(_) => None,
                };
                self.build_source(source, alias, params)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(sources.join(", "))
    }

    fn build_source(
        &self,
        source: &TableSource,
        alias: Option<&str>,
        params: &mut Params,
    ) -> Result<String> {
        match (source, alias) {
            (TableSource::Table(table), Some(alias)) if alias != table.as_str() => Ok(format!(
                "{} {}",
                self.quote_table(table),
                self.dialect().quote_simple_table_name(alias)
            )),
            (TableSource::Table(table), _) => Ok(self.quote_table(table)),
            (TableSource::Query(query), Some(alias)) => Ok(format!(
                "({}) {}",
                self.build(query, params)?,
                self.dialect().quote_simple_table_name(alias)
            )),
            (TableSource::Expr(expr), Some(alias)) => Ok(format!(
                "{} {}",
                self.build_expression(expr, params)?,
                self.dialect().quote_simple_table_name(alias)
            )),
            (TableSource::Query(_) | TableSource::Expr(_), None) => Err(BuildError::invalid(
                "a sub-query or expression used as a table source needs an explicit alias",
            )),
        }
    }

    fn build_join(&self, join: &Join, params: &mut Params) -> Result<String> {
        let source = self.build_source(&join.source, join.alias.as_deref(), params)?;
        let mut sql = format!("{} {source}", join.kind.as_sql());
        if let Some(on) = &join.on {
            let condition = self.build_condition(on, params)?;
            if !condition.is_empty() {
                sql.push_str(&format!(" ON {condition}"));
            }
        }
        Ok(sql)
    }

    fn build_group_by(&self, items: &[GroupItem], params: &mut Params) -> Result<String> {
        let parts = items
            .iter()
            .map(|item| match item {
                GroupItem::Column(column) => Ok(self.quote_column(column)),
                GroupItem::Expr(expr) => self.build_expression(expr, params),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn build_order_by(&self, items: &[OrderItem], params: &mut Params) -> Result<String> {
        let parts = items
            .iter()
            .map(|item| match item {
                OrderItem::Column(column, direction) => {
                    let column = self.quote_column(column);
                    Ok(match direction {
                        Direction::Asc => column,
                        Direction::Desc => format!("{column} DESC"),
                    })
                }
                OrderItem::Expr(expr) => self.build_expression(expr, params),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn build_with(&self, query: &Query, params: &mut Params) -> Result<String> {
        let recursive = query.with.iter().any(|w| w.recursive);
        let parts = query
            .with
            .iter()
            .map(|with| {
                Ok(format!(
                    "{} AS ({})",
                    self.quote_table(&with.name),
                    self.build(&with.query, params)?
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let keyword = if recursive { "WITH RECURSIVE" } else { "WITH" };
        Ok(format!("{keyword} {}", parts.join(", ")))
    }
}
