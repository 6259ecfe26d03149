//! Status checking for ad-hoc and prepared statements.

mod common;

use common::{Call, MockConnection, Reply};
use pgexec::exec::{execute, execute_prepared, execute_simple};
use pgexec::{ExecError, ExecStatus, Params, QueryResult, exec_sql};
use pretty_assertions::assert_eq;

#[test]
fn simple_returns_live_result_on_match() {
    let mut conn = MockConnection::new().reply(Reply::tuples(&["?column?"], &[&[Some("1")]]));

    let res = execute_simple(&mut conn, ExecStatus::TuplesOk, "SELECT 1").unwrap();
    assert_eq!(res.status(), ExecStatus::TuplesOk);
    assert_eq!(res.value(0, 0), Some("1"));
    assert_eq!(conn.live_results(), 1);

    drop(res);
    assert_eq!(conn.live_results(), 0);
}

#[test]
fn simple_mismatch_names_statement_and_releases_result() {
    let mut conn = MockConnection::new().reply(Reply::status(ExecStatus::TuplesOk));

    let err = execute_simple(&mut conn, ExecStatus::CommandOk, "SELECT 1").unwrap_err();
    match &err {
        ExecError::Statement {
            sql,
            expected,
            actual,
            ..
        } => {
            assert_eq!(sql, "SELECT 1");
            assert_eq!(*expected, ExecStatus::CommandOk);
            assert_eq!(*actual, ExecStatus::TuplesOk);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let text = err.to_string();
    assert!(text.starts_with("SELECT 1 failed:"));
    assert!(text.contains("expected PGRES_COMMAND_OK"));
    assert!(text.contains("got PGRES_TUPLES_OK"));
    assert_eq!(conn.live_results(), 0);
}

#[test]
fn simple_mismatch_carries_server_message() {
    let mut conn = MockConnection::new()
        .reply(Reply::fatal("ERROR:  relation \"nodes\" does not exist\n"));

    let err = execute_simple(&mut conn, ExecStatus::TuplesOk, "SELECT * FROM nodes").unwrap_err();
    assert_eq!(
        err.to_string(),
        "SELECT * FROM nodes failed: ERROR:  relation \"nodes\" does not exist \
         (expected PGRES_TUPLES_OK, got PGRES_FATAL_ERROR)"
    );
    assert_eq!(
        err.diagnostic(),
        Some("ERROR:  relation \"nodes\" does not exist\n")
    );
    assert_eq!(conn.live_results(), 0);
}

#[test]
fn simple_client_side_error_sends_nothing() {
    let mut conn = MockConnection::new();
    let err = execute_simple(&mut conn, ExecStatus::CommandOk, "SELECT '\0'").unwrap_err();
    assert!(matches!(err, ExecError::NulByte(_)));
    assert!(conn.calls().is_empty());
    assert_eq!(conn.live_results(), 0);
}

#[test]
fn formatted_execute_sends_formatted_text_and_releases() {
    let mut conn = MockConnection::new().reply(Reply::command("DROP TABLE"));

    execute(
        &mut conn,
        ExecStatus::CommandOk,
        format_args!("DROP TABLE IF EXISTS {}_{}", "planet_osm", "ways"),
    )
    .unwrap();

    assert_eq!(
        conn.calls(),
        vec![Call::Exec("DROP TABLE IF EXISTS planet_osm_ways".to_string())]
    );
    assert_eq!(conn.live_results(), 0);
}

#[test]
fn exec_sql_macro_reports_mismatch() {
    let mut conn = MockConnection::new().reply(Reply::fatal("ERROR:  syntax error\n"));
    let long_name = "n".repeat(300);

    let err = exec_sql!(&mut conn, ExecStatus::CommandOk, "CREATE TABLE {} ()", long_name)
        .unwrap_err();
    assert!(err.is_status_mismatch());
    assert!(err.to_string().contains(&long_name));
    assert_eq!(conn.live_results(), 0);
}

#[test]
fn prepared_tuples_hands_back_result() {
    let mut conn = MockConnection::new().reply(Reply::tuples(
        &["id", "name"],
        &[&[Some("7"), None]],
    ));
    let params = Params::new().with("7");

    let res = execute_prepared(&mut conn, "get_node", &params, ExecStatus::TuplesOk)
        .unwrap()
        .expect("tuples expected");
    assert_eq!(res.rows(), 1);
    assert_eq!(res.column_name(1), Some("name"));
    assert_eq!(res.value(0, 1), None);
    assert_eq!(conn.live_results(), 1);
    assert_eq!(
        conn.calls(),
        vec![Call::Prepared("get_node".to_string(), vec![Some("7".to_string())])]
    );
}

#[test]
fn prepared_command_releases_result() {
    let mut conn = MockConnection::new().reply(Reply::command("INSERT 0 1"));
    let params = Params::new().with("7").with_null();

    let res = execute_prepared(&mut conn, "insert_node", &params, ExecStatus::CommandOk).unwrap();
    assert!(res.is_none());
    assert_eq!(conn.live_results(), 0);
    assert_eq!(
        conn.calls(),
        vec![Call::Prepared(
            "insert_node".to_string(),
            vec![Some("7".to_string()), None]
        )]
    );
}

#[test]
fn prepared_mismatch_lists_parameters() {
    let mut conn = MockConnection::new().reply(Reply::fatal("ERROR:  duplicate key\n"));
    let params = Params::new().with("7").with_null().with("x\ty");

    let err =
        execute_prepared(&mut conn, "insert_node", &params, ExecStatus::CommandOk).unwrap_err();
    match &err {
        ExecError::Prepared {
            name,
            actual,
            params: reported,
            ..
        } => {
            assert_eq!(name, "insert_node");
            assert_eq!(*actual, ExecStatus::FatalError);
            assert_eq!(reported, &params);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "insert_node failed: ERROR:  duplicate key(PGRES_FATAL_ERROR)\nArguments were: 7, NULL, x\ty"
    );
    assert_eq!(conn.live_results(), 0);
}

#[test]
fn prepared_unexpected_tuples_is_mismatch() {
    let mut conn = MockConnection::new().reply(Reply::tuples(&["a"], &[]));
    let err = execute_prepared(&mut conn, "s", &Params::new(), ExecStatus::CommandOk).unwrap_err();
    assert!(err.is_status_mismatch());
    assert_eq!(conn.live_results(), 0);
}

#[test]
fn copy_in_expectation_is_checked_like_any_other() {
    let mut conn = MockConnection::new().reply(Reply::status(ExecStatus::CopyIn));
    let res = execute_simple(&mut conn, ExecStatus::CopyIn, "COPY nodes FROM STDIN").unwrap();
    assert_eq!(res.status(), ExecStatus::CopyIn);
}
