//! SELECT query description.
//!
//! A [`Query`] is a structured, dialect-free description of a SELECT
//! statement. It is rendered by [`QueryBuilder::build`](crate::QueryBuilder::build)
//! and can be nested anywhere a sub-query is accepted.

use std::hash::Hash;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::condition::Condition;
use crate::error::{BuildError, Result};
use crate::expression::Expression;
use crate::param::Params;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Key of a select-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectKey {
    /// An explicit alias.
    Alias(String),
    /// An unaliased column, keyed by its name.
    Column(String),
    /// An unaliased expression.
    Anonymous(usize),
}

/// A select-list entry.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// A column name, or any SQL containing `(` which is kept verbatim.
    Column(String),
    /// An expression or sub-query.
    Expr(Expression),
}

impl From<&str> for SelectItem {
    fn from(column: &str) -> Self {
        Self::Column(String::from(column))
    }
}

impl From<Expression> for SelectItem {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr)
    }
}

impl From<Query> for SelectItem {
    fn from(query: Query) -> Self {
        Self::Expr(Expression::Query(Box::new(query)))
    }
}

/// Key of a FROM source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FromKey {
    /// Alias, or the table name itself for unaliased tables.
    Alias(String),
    /// A source declared without alias. Only plain tables may be anonymous.
    Anonymous(usize),
}

/// A FROM or JOIN source.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// A table name.
    Table(String),
    /// A sub-query.
    Query(Box<Query>),
    /// An arbitrary table expression.
    Expr(Expression),
}

impl From<&str> for TableSource {
    fn from(table: &str) -> Self {
        Self::Table(String::from(table))
    }
}

impl From<Query> for TableSource {
    fn from(query: Query) -> Self {
        Self::Query(Box::new(query))
    }
}

impl From<Expression> for TableSource {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr)
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
    /// RIGHT JOIN.
    Right,
    /// CROSS JOIN.
    Cross,
}

impl JoinKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join type.
    pub kind: JoinKind,
    /// Joined source.
    pub source: TableSource,
    /// Alias of the joined source.
    pub alias: Option<String>,
    /// ON condition.
    pub on: Option<Condition>,
}

/// ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderItem {
    /// A column and direction.
    Column(String, Direction),
    /// An expression, rendered verbatim.
    Expr(Expression),
}

/// GROUP BY entry.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupItem {
    /// A column.
    Column(String),
    /// An expression, rendered verbatim.
    Expr(Expression),
}

/// A query combined with UNION.
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    /// The combined query.
    pub query: Query,
    /// UNION ALL.
    pub all: bool,
}

/// A common table expression.
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    /// CTE name.
    pub name: String,
    /// CTE body.
    pub query: Query,
    /// Whether the CTE is recursive.
    pub recursive: bool,
}

/// A SELECT query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub(crate) select: IndexMap<SelectKey, SelectItem>,
    pub(crate) distinct: bool,
    pub(crate) from: IndexMap<FromKey, TableSource>,
    pub(crate) joins: Vec<Join>,
    pub(crate) where_condition: Option<Condition>,
    pub(crate) group_by: Vec<GroupItem>,
    pub(crate) having: Option<Condition>,
    pub(crate) order_by: Vec<OrderItem>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) unions: Vec<Union>,
    pub(crate) with: Vec<With>,
    pub(crate) params: Params,
    anonymous: usize,
}

fn alias_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(.*?)(?:\s+as\s+|\s+)([\w\-\.]+)$")
            .unwrap_or_else(|e| unreachable!("invalid alias pattern: {e}"))
    })
}

fn direction_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(.*?)\s+(asc|desc)$")
            .unwrap_or_else(|e| unreachable!("invalid direction pattern: {e}"))
    })
}

/// Splits `"expr AS alias"` or `"expr alias"`. Text containing `(` is never
/// split.
fn split_alias(text: &str) -> (&str, Option<&str>) {
    let text = text.trim();
    if text.contains('(') {
        return (text, None);
    }
    match alias_regex().captures(text) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(expr), Some(alias)) if !expr.as_str().is_empty() => {
                (expr.as_str(), Some(alias.as_str()))
            }
            _ => (text, None),
        },
        None => (text, None),
    }
}

/// Splits a comma-separated list, or keeps it whole if it contains `(`.
fn split_list(text: &str) -> Vec<&str> {
    if text.contains('(') {
        return vec![text.trim()];
    }
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Inserts an entry with last-declaration-wins semantics. Declaring the
/// exact same entry again is a no-op and keeps its position.
fn declare<K: Hash + Eq, V: PartialEq>(map: &mut IndexMap<K, V>, key: K, value: V) {
    if map.get(&key) == Some(&value) {
        return;
    }
    map.shift_remove(&key);
    map.insert(key, value);
}

fn parse_order_items(columns: &str) -> Vec<OrderItem> {
    if columns.contains('(') {
        return vec![OrderItem::Expr(Expression::raw(columns.trim()))];
    }
    split_list(columns)
        .into_iter()
        .map(|part| match direction_regex().captures(part) {
            Some(caps) => {
                let column = caps.get(1).map_or(part, |m| m.as_str());
                let desc = caps
                    .get(2)
                    .is_some_and(|m| m.as_str().eq_ignore_ascii_case("desc"));
                let direction = if desc { Direction::Desc } else { Direction::Asc };
                OrderItem::Column(String::from(column), direction)
            }
            None => OrderItem::Column(String::from(part), Direction::Asc),
        })
        .collect()
}

impl Query {
    /// Creates an empty query (`SELECT *`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the select list with the given columns.
    ///
    /// Each entry may carry an alias as `"col AS alias"` or `"col alias"`.
    #[must_use]
    pub fn select<S: AsRef<str>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.select.clear();
        self.add_select(columns)
    }

    /// Adds columns to the select list.
    #[must_use]
    pub fn add_select<S: AsRef<str>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        for column in columns {
            let (expr, alias) = split_alias(column.as_ref());
            let item = SelectItem::Column(String::from(expr));
            let key = match alias {
                Some(alias) => SelectKey::Alias(String::from(alias)),
                None => SelectKey::Column(String::from(expr)),
            };
            declare(&mut self.select, key, item);
        }
        self
    }

    /// Adds an aliased select entry.
    #[must_use]
    pub fn select_as(mut self, alias: impl Into<String>, item: impl Into<SelectItem>) -> Self {
        declare(&mut self.select, SelectKey::Alias(alias.into()), item.into());
        self
    }

    /// Adds an unaliased expression to the select list.
    #[must_use]
    pub fn select_expr(mut self, expr: impl Into<Expression>) -> Self {
        let key = SelectKey::Anonymous(self.anonymous);
        self.anonymous += 1;
        self.select.insert(key, SelectItem::Expr(expr.into()));
        self
    }

    /// Sets SELECT DISTINCT.
    #[must_use]
    pub const fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Replaces the FROM sources with the given tables, each optionally
    /// aliased as `"table alias"` or `"table AS alias"`.
    #[must_use]
    pub fn from(mut self, tables: &str) -> Self {
        self.from.clear();
        self.add_from(tables)
    }

    /// Adds comma-separated FROM tables.
    #[must_use]
    pub fn add_from(mut self, tables: &str) -> Self {
        for part in split_list(tables) {
            let (table, alias) = split_alias(part);
            let key = FromKey::Alias(String::from(alias.unwrap_or(table)));
            declare(&mut self.from, key, TableSource::Table(String::from(table)));
        }
        self
    }

    /// Adds an aliased FROM source.
    #[must_use]
    pub fn from_as(mut self, alias: impl Into<String>, source: impl Into<TableSource>) -> Self {
        declare(&mut self.from, FromKey::Alias(alias.into()), source.into());
        self
    }

    /// Adds an unaliased FROM source. Sub-queries and expressions declared
    /// this way fail to build.
    #[must_use]
    pub fn from_source(mut self, source: impl Into<TableSource>) -> Self {
        let key = FromKey::Anonymous(self.anonymous);
        self.anonymous += 1;
        self.from.insert(key, source.into());
        self
    }

    /// Adds a JOIN on a table given as `"table"` or `"table alias"`.
    #[must_use]
    pub fn join(mut self, kind: JoinKind, table: &str, on: impl Into<Option<Condition>>) -> Self {
        let (table, alias) = split_alias(table);
        self.joins.push(Join {
            kind,
            source: TableSource::Table(String::from(table)),
            alias: alias.map(String::from),
            on: on.into(),
        });
        self
    }

    /// Adds an INNER JOIN.
    #[must_use]
    pub fn inner_join(self, table: &str, on: Condition) -> Self {
        self.join(JoinKind::Inner, table, on)
    }

    /// Adds a LEFT JOIN.
    #[must_use]
    pub fn left_join(self, table: &str, on: Condition) -> Self {
        self.join(JoinKind::Left, table, on)
    }

    /// Adds a RIGHT JOIN.
    #[must_use]
    pub fn right_join(self, table: &str, on: Condition) -> Self {
        self.join(JoinKind::Right, table, on)
    }

    /// Adds a JOIN on an aliased sub-query or expression.
    #[must_use]
    pub fn join_source(
        mut self,
        kind: JoinKind,
        alias: impl Into<String>,
        source: impl Into<TableSource>,
        on: impl Into<Option<Condition>>,
    ) -> Self {
        self.joins.push(Join {
            kind,
            source: source.into(),
            alias: Some(alias.into()),
            on: on.into(),
        });
        self
    }

    /// Replaces the WHERE condition.
    #[must_use]
    pub fn where_clause(mut self, condition: Condition) -> Self {
        self.where_condition = Some(condition);
        self
    }

    /// Adds a condition with AND.
    #[must_use]
    pub fn and_where(mut self, condition: Condition) -> Self {
        self.where_condition = Some(combine_and(self.where_condition.take(), condition));
        self
    }

    /// Adds a condition with OR.
    #[must_use]
    pub fn or_where(mut self, condition: Condition) -> Self {
        self.where_condition = Some(combine_or(self.where_condition.take(), condition));
        self
    }

    /// Replaces the WHERE condition with a filtered copy of `condition`.
    /// If every leaf is empty the query has no WHERE clause.
    #[must_use]
    pub fn filter_where(mut self, condition: &Condition) -> Self {
        self.where_condition = condition.filtered();
        self
    }

    /// Adds a filtered condition with AND, if anything is left of it.
    #[must_use]
    pub fn and_filter_where(self, condition: &Condition) -> Self {
        match condition.filtered() {
            Some(c) => self.and_where(c),
            None => self,
        }
    }

    /// Adds a filtered condition with OR, if anything is left of it.
    #[must_use]
    pub fn or_filter_where(self, condition: &Condition) -> Self {
        match condition.filtered() {
            Some(c) => self.or_where(c),
            None => self,
        }
    }

    /// Replaces the GROUP BY list with comma-separated columns.
    #[must_use]
    pub fn group_by(mut self, columns: &str) -> Self {
        self.group_by.clear();
        self.add_group_by(columns)
    }

    /// Adds comma-separated GROUP BY columns.
    #[must_use]
    pub fn add_group_by(mut self, columns: &str) -> Self {
        if columns.contains('(') {
            self.group_by
                .push(GroupItem::Expr(Expression::raw(columns.trim())));
            return self;
        }
        self.group_by.extend(
            split_list(columns)
                .into_iter()
                .map(|c| GroupItem::Column(String::from(c))),
        );
        self
    }

    /// Adds a GROUP BY expression.
    #[must_use]
    pub fn group_by_expr(mut self, expr: impl Into<Expression>) -> Self {
        self.group_by.push(GroupItem::Expr(expr.into()));
        self
    }

    /// Replaces the HAVING condition.
    #[must_use]
    pub fn having(mut self, condition: Condition) -> Self {
        self.having = Some(condition);
        self
    }

    /// Adds a HAVING condition with AND.
    #[must_use]
    pub fn and_having(mut self, condition: Condition) -> Self {
        self.having = Some(combine_and(self.having.take(), condition));
        self
    }

    /// Adds a HAVING condition with OR.
    #[must_use]
    pub fn or_having(mut self, condition: Condition) -> Self {
        self.having = Some(combine_or(self.having.take(), condition));
        self
    }

    /// Replaces ORDER BY with a parsed `"a DESC, b"` list.
    #[must_use]
    pub fn order_by(mut self, columns: &str) -> Self {
        self.order_by.clear();
        self.add_order_by(columns)
    }

    /// Adds a parsed `"a DESC, b"` list to ORDER BY.
    #[must_use]
    pub fn add_order_by(mut self, columns: &str) -> Self {
        for item in parse_order_items(columns) {
            self.push_order(item);
        }
        self
    }

    /// Adds `column → direction` entries to ORDER BY.
    #[must_use]
    pub fn order_by_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = (S, Direction)>,
    ) -> Self {
        for (column, direction) in columns {
            self.push_order(OrderItem::Column(column.into(), direction));
        }
        self
    }

    /// Adds an ORDER BY expression.
    #[must_use]
    pub fn order_by_expr(mut self, expr: impl Into<Expression>) -> Self {
        self.order_by.push(OrderItem::Expr(expr.into()));
        self
    }

    /// Columns are unique in ORDER BY: a repeated column keeps its place and
    /// takes the new direction.
    fn push_order(&mut self, item: OrderItem) {
        if let OrderItem::Column(name, direction) = &item {
            for existing in &mut self.order_by {
                if let OrderItem::Column(existing_name, existing_direction) = existing {
                    if existing_name == name {
                        *existing_direction = *direction;
                        return;
                    }
                }
            }
        }
        self.order_by.push(item);
    }

    /// Sets LIMIT.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets OFFSET.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Appends `UNION query`.
    #[must_use]
    pub fn union(mut self, query: Self) -> Self {
        self.unions.push(Union { query, all: false });
        self
    }

    /// Appends `UNION ALL query`.
    #[must_use]
    pub fn union_all(mut self, query: Self) -> Self {
        self.unions.push(Union { query, all: true });
        self
    }

    /// Prepends `WITH name AS (query)`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, query: Self) -> Self {
        self.with.push(With {
            name: name.into(),
            query,
            recursive: false,
        });
        self
    }

    /// Prepends `WITH RECURSIVE name AS (query)`.
    #[must_use]
    pub fn with_recursive(mut self, name: impl Into<String>, query: Self) -> Self {
        self.with.push(With {
            name: name.into(),
            query,
            recursive: true,
        });
        self
    }

    /// Replaces the query's own parameters, used by raw fragments.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Adds parameters.
    #[must_use]
    pub fn add_params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// Returns the WHERE condition.
    #[must_use]
    pub fn where_condition(&self) -> Option<&Condition> {
        self.where_condition.as_ref()
    }

    /// Returns the select list.
    #[must_use]
    pub fn select_list(&self) -> &IndexMap<SelectKey, SelectItem> {
        &self.select
    }

    /// Returns the FROM sources.
    #[must_use]
    pub fn from_sources(&self) -> &IndexMap<FromKey, TableSource> {
        &self.from
    }

    /// Returns the ORDER BY entries.
    #[must_use]
    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_by
    }

    /// Column names produced by this query, used as the target columns of
    /// `INSERT ... SELECT`.
    ///
    /// # Errors
    ///
    /// Fails when the select list is empty, contains `*`, or contains an
    /// expression without alias, because the column mapping is ambiguous.
    pub fn column_names(&self) -> Result<Vec<String>> {
        if self.select.is_empty() {
            return Err(BuildError::invalid(
                "expected a select query with enumerated (named) columns, got an empty select list",
            ));
        }
        self.select
            .iter()
            .map(|(key, item)| match (key, item) {
                (SelectKey::Alias(alias), _) => Ok(alias.clone()),
                (SelectKey::Column(_), SelectItem::Column(column)) => {
                    let name = column.rsplit('.').next().unwrap_or(column);
                    let name = name.trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'));
                    if name == "*" {
                        return Err(BuildError::invalid(
                            "expected a select query with enumerated (named) columns, got `*`",
                        ));
                    }
                    Ok(String::from(name))
                }
                _ => Err(BuildError::invalid(
                    "select expressions used as INSERT source need an alias",
                )),
            })
            .collect()
    }
}

fn combine_and(existing: Option<Condition>, condition: Condition) -> Condition {
    match existing {
        None => condition,
        Some(Condition::And(mut children)) => {
            children.push(condition);
            Condition::And(children)
        }
        Some(old) => Condition::And(vec![old, condition]),
    }
}

fn combine_or(existing: Option<Condition>, condition: Condition) -> Condition {
    match existing {
        None => condition,
        Some(Condition::Or(mut children)) => {
            children.push(condition);
            Condition::Or(children)
        }
        Some(old) => Condition::Or(vec![old, condition]),
    }
}
