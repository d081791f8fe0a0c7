mod common;

use common::{connection, users, Event, MockDriver};
use sqlforge_command::{CommandError, CommandState, IsolationLevel};
use sqlforge_core::{Condition, InsertSource, ParamKey, ParamType, Params, Query, SqlValue};

#[tokio::test]
async fn set_sql_resolves_markers_and_resets() {
    let mut conn = connection(MockDriver::new());
    let mut command = conn.create_command("SELECT [[id]] FROM {{user}} WHERE id = :id");
    assert_eq!(command.sql(), "SELECT \"id\" FROM \"user\" WHERE id = :id");

    command.bind_value(":id", 1_i64);
    command.require_transaction(IsolationLevel::Serializable);
    command.prepare().await.unwrap();
    assert_eq!(command.state(), CommandState::Prepared);

    command.set_raw_sql("SELECT {{raw}}");
    assert_eq!(command.sql(), "SELECT {{raw}}");
    assert!(command.params().is_empty());
    assert_eq!(command.state(), CommandState::Idle);
    drop(command);

    assert_eq!(conn.driver().count(|e| *e == Event::Close), 1);
}

#[tokio::test]
async fn prepare_is_idempotent() {
    let mut conn = connection(MockDriver::new());
    let mut command = conn.create_command("SELECT 1");
    command.prepare().await.unwrap();
    command.prepare().await.unwrap();
    drop(command);

    let prepares = conn
        .driver()
        .count(|e| matches!(e, Event::Prepare(_)));
    assert_eq!(prepares, 1);
}

#[tokio::test]
async fn execute_walks_the_state_machine() {
    let mut conn = connection(MockDriver::new().with_affected(3));
    let mut command = conn.create_command("UPDATE t SET a = :a");
    command.bind_value(":a", "x");
    assert_eq!(command.state(), CommandState::Idle);

    assert_eq!(command.execute().await.unwrap(), 3);
    assert_eq!(command.state(), CommandState::Executed);

    command.cancel();
    assert_eq!(command.state(), CommandState::Cancelled);
    command.cancel();
    assert_eq!(command.state(), CommandState::Cancelled);

    // a cancelled command prepares again
    assert_eq!(command.execute().await.unwrap(), 3);
    drop(command);

    let driver = conn.driver();
    assert_eq!(driver.count(|e| matches!(e, Event::Prepare(_))), 2);
    assert_eq!(driver.count(|e| *e == Event::Close), 2);
    assert_eq!(
        driver.events[1],
        Event::Bind(ParamKey::named("a"), SqlValue::Text("x".into()))
    );
}

#[tokio::test]
async fn empty_sql_is_a_no_op() {
    let mut conn = connection(MockDriver::new().with_affected(9));
    let mut command = conn.create_command("");
    assert_eq!(command.execute().await.unwrap(), 0);
    assert_eq!(command.query_one().await.unwrap(), None);
    assert!(command.query_all().await.unwrap().is_empty());
    assert_eq!(command.query_scalar().await.unwrap(), None);
    assert_eq!(command.query().await.unwrap().remaining(), 0);
    drop(command);

    assert!(conn.driver().events.is_empty());
}

#[tokio::test]
async fn query_modes_shape_rows() {
    let mut conn = connection(MockDriver::new().with_rows(users()));
    let mut command = conn.create_command("SELECT id, name FROM user");

    assert_eq!(command.query_all().await.unwrap(), users());
    assert_eq!(command.state(), CommandState::ResultConsumed);
    assert_eq!(
        command.query_one().await.unwrap(),
        users().into_iter().next()
    );
    assert_eq!(
        command.query_column().await.unwrap(),
        vec![SqlValue::Int(1), SqlValue::Int(2)]
    );
    assert_eq!(command.query_scalar().await.unwrap(), Some(SqlValue::Int(1)));

    let mut reader = command.query().await.unwrap();
    assert_eq!(reader.column_names(), vec!["id", "name"]);
    let names: Vec<SqlValue> = reader.by_ref().map(|row| row["name"].clone()).collect();
    assert_eq!(
        names,
        vec![SqlValue::Text("alice".into()), SqlValue::Text("bob".into())]
    );
    assert_eq!(reader.position(), 2);
}

#[tokio::test]
async fn no_rows_is_not_an_error() {
    let mut conn = connection(MockDriver::new());
    let mut command = conn.create_command("SELECT id FROM user WHERE 0");
    assert_eq!(command.query_one().await.unwrap(), None);
    assert_eq!(command.query_scalar().await.unwrap(), None);
    assert!(command.query_column().await.unwrap().is_empty());
}

#[tokio::test]
async fn raw_sql_inlines_bound_values() {
    let mut conn = connection(MockDriver::new());
    let mut command = conn.create_command("SELECT * FROM customer WHERE id = :id AND active = :active");
    command.bind_values([(":id", SqlValue::Int(1)), (":active", SqlValue::Bool(false))]);
    assert_eq!(
        command.raw_sql(),
        "SELECT * FROM customer WHERE id = 1 AND active = FALSE"
    );

    command.set_sql("SELECT * FROM customer WHERE id = :id");
    command.bind_typed(":id", 1_i64, ParamType::String);
    assert_eq!(command.raw_sql(), "SELECT * FROM customer WHERE id = '1'");
}

#[tokio::test]
async fn built_statements_carry_their_params() {
    let mut conn = connection(MockDriver::new().with_affected(1));
    let mut command = conn.create_command("");
    command
        .insert("user", &InsertSource::values([("name", "alice")]))
        .unwrap();
    assert_eq!(command.sql(), "INSERT INTO \"user\" (\"name\") VALUES (:qp0)");
    assert_eq!(command.raw_sql(), "INSERT INTO \"user\" (\"name\") VALUES ('alice')");

    command
        .delete("user", Some(&Condition::eq("id", 4)), Params::new())
        .unwrap();
    assert_eq!(command.raw_sql(), "DELETE FROM \"user\" WHERE \"id\" = 4");
    assert_eq!(command.execute().await.unwrap(), 1);

    let query = Query::new().select(["id"]).from("user").limit(1);
    command.set_query(&query).unwrap();
    assert_eq!(command.sql(), "SELECT \"id\" FROM \"user\" LIMIT 1");
}

#[tokio::test]
async fn driver_failures_report_raw_sql() {
    let mut driver = MockDriver::new();
    driver.reject_prepare = true;
    let mut conn = connection(driver);
    let mut command = conn.create_command("SELEC * FROM t WHERE id = :id");
    command.bind_value(":id", 5_i64);

    let err = command.execute().await.unwrap_err();
    match &err {
        CommandError::Execution { raw_sql, .. } => {
            assert_eq!(raw_sql, "SELEC * FROM t WHERE id = 5");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err
        .to_string()
        .ends_with("The SQL being executed was: SELEC * FROM t WHERE id = 5"));
}
