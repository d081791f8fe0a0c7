#![allow(dead_code)]

use std::collections::VecDeque;

use sqlforge_command::{
    Connection, ConnectionConfig, DialectKind, Driver, DriverError, IsolationLevel, Row,
    TransactionBoundary,
};
use sqlforge_core::{Param, ParamKey, SqlValue};

/// Something the driver was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Prepare(String),
    Bind(ParamKey, SqlValue),
    Execute(String),
    Fetch(String),
    Close,
    Begin(Option<IsolationLevel>),
    Commit,
    Rollback,
}

#[derive(Debug)]
pub struct MockStatement {
    sql: String,
}

/// A driver that records every call and replays scripted results.
#[derive(Debug, Default)]
pub struct MockDriver {
    pub events: Vec<Event>,
    pub rows: Vec<Row>,
    pub affected: u64,
    pub failures: VecDeque<DriverError>,
    pub reject_prepare: bool,
    pub commit_failures: usize,
    in_transaction: bool,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn failing(mut self, times: usize) -> Self {
        for _ in 0..times {
            self.failures
                .push_back(DriverError::new("database is locked").with_code("5"));
        }
        self
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| matches(e)).count()
    }

    pub fn executed(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Execute(sql) | Event::Fetch(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }
}

impl TransactionBoundary for MockDriver {
    async fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<(), DriverError> {
        self.events.push(Event::Begin(isolation));
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.events.push(Event::Commit);
        if self.commit_failures > 0 {
            self.commit_failures -= 1;
            return Err(DriverError::new("disk I/O error").with_code("10"));
        }
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.events.push(Event::Rollback);
        self.in_transaction = false;
        Ok(())
    }

    fn is_in_transaction(&self) -> bool {
        self.in_transaction
    }
}

impl Driver for MockDriver {
    type Statement = MockStatement;

    async fn prepare(&mut self, sql: &str) -> Result<MockStatement, DriverError> {
        self.events.push(Event::Prepare(String::from(sql)));
        if self.reject_prepare {
            return Err(DriverError::new("syntax error"));
        }
        Ok(MockStatement {
            sql: String::from(sql),
        })
    }

    fn bind_param(
        &mut self,
        _statement: &mut MockStatement,
        key: &ParamKey,
        param: &Param,
    ) -> Result<(), DriverError> {
        self.events
            .push(Event::Bind(key.clone(), param.value().clone()));
        Ok(())
    }

    async fn execute(&mut self, statement: &mut MockStatement) -> Result<u64, DriverError> {
        self.events.push(Event::Execute(statement.sql.clone()));
        match self.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(self.affected),
        }
    }

    async fn fetch_all(&mut self, statement: &mut MockStatement) -> Result<Vec<Row>, DriverError> {
        self.events.push(Event::Fetch(statement.sql.clone()));
        match self.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(self.rows.clone()),
        }
    }

    fn close(&mut self, _statement: MockStatement) {
        self.events.push(Event::Close);
    }
}

pub fn config() -> ConnectionConfig {
    ConnectionConfig::new("mock://test", DialectKind::Sqlite)
}

/// Routes `RUST_LOG` filtered output to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn connection(driver: MockDriver) -> Connection<MockDriver> {
    init_tracing();
    Connection::new(driver, config())
}

pub fn row(pairs: &[(&str, SqlValue)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (String::from(*k), v.clone()))
        .collect()
}

pub fn users() -> Vec<Row> {
    vec![
        row(&[("id", SqlValue::Int(1)), ("name", SqlValue::Text("alice".into()))]),
        row(&[("id", SqlValue::Int(2)), ("name", SqlValue::Text("bob".into()))]),
    ]
}
