mod support;

use pgtyped::introspect::columns::resolve_columns;
use support::{column, FakeDatabase, INT8, TEXT, UUID};

fn params(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn retrieval_query_is_probed_with_placeholders_and_zero_limit() {
    let db = FakeDatabase::new().with_columns(
        "FROM users",
        vec![column("id", UUID), column("email", TEXT)],
    );
    let mut session = db.session();

    let columns = resolve_columns(
        &mut session,
        "SELECT id, email FROM users WHERE id = :id",
        &params(&["id"]),
    )
    .expect("probe should succeed");

    assert_eq!(columns, vec![column("id", UUID), column("email", TEXT)]);
    assert_eq!(
        db.script().probes,
        vec!["SELECT id, email FROM users WHERE id = $1\nLIMIT 0".to_string()]
    );
}

#[test]
fn shapeless_statements_are_never_probed() {
    let db = FakeDatabase::new();
    let mut session = db.session();

    for sql in [
        "DELETE FROM users WHERE id = :id",
        "UPDATE users SET email = :email WHERE id = :id",
        "INSERT INTO users (email) VALUES (:email)",
        "TRUNCATE users",
        "WITH stale AS (SELECT id FROM users) DELETE FROM users WHERE id IN (SELECT id FROM stale)",
        "WITH fresh AS (SELECT :email AS email) INSERT INTO users (email) SELECT email FROM fresh RETURNING id",
    ] {
        let columns = resolve_columns(&mut session, sql, &params(&["email", "id"]))
            .expect("shapeless statements resolve without the database");
        assert!(columns.is_empty(), "{sql}");
    }
    assert!(db.script().probes.is_empty());
}

#[test]
fn cte_and_parenthesized_selects_are_probed() {
    let db = FakeDatabase::new().with_columns("FROM x", vec![column("n", INT8)]);
    let mut session = db.session();

    for sql in [
        "WITH x AS (SELECT 1 AS n) SELECT n FROM x",
        "(SELECT n FROM x)",
    ] {
        let columns = resolve_columns(&mut session, sql, &[]).expect("probe should succeed");
        assert_eq!(columns, vec![column("n", INT8)], "{sql}");
    }
}

#[test]
fn literal_limit_is_not_doubled() {
    let db = FakeDatabase::new().with_columns("FROM users", vec![column("id", UUID)]);
    let mut session = db.session();

    resolve_columns(&mut session, "SELECT id FROM users ORDER BY id LIMIT 10", &[])
        .expect("describe should succeed");

    assert_eq!(
        db.script().probes,
        vec!["SELECT id FROM users ORDER BY id LIMIT 10".to_string()]
    );
}

#[test]
fn parameterized_limit_is_wrapped_in_a_zero_row_select() {
    let db = FakeDatabase::new().with_columns("FROM users", vec![column("id", UUID)]);
    let mut session = db.session();

    let columns = resolve_columns(
        &mut session,
        "SELECT id FROM users ORDER BY id LIMIT :n",
        &params(&["n"]),
    )
    .expect("describe should succeed");

    assert_eq!(columns, vec![column("id", UUID)]);
    assert_eq!(
        db.script().probes,
        vec!["SELECT * FROM (\nSELECT id FROM users ORDER BY id LIMIT $1\n) AS described\nLIMIT 0"
            .to_string()]
    );
}

#[test]
fn trailing_line_comment_does_not_hide_zero_limit() {
    let db = FakeDatabase::new().with_columns("FROM users", vec![column("id", UUID)]);
    let mut session = db.session();

    resolve_columns(&mut session, "SELECT id FROM users -- every user", &[])
        .expect("describe should succeed");

    assert_eq!(
        db.script().probes,
        vec!["SELECT id FROM users -- every user\nLIMIT 0".to_string()]
    );
}

#[test]
fn failed_probe_is_rolled_back_and_retried_once() {
    let db = FakeDatabase::new()
        .with_columns("FROM users", vec![column("id", UUID)])
        .with_probe_failures(1);
    let mut session = db.session();

    let columns =
        resolve_columns(&mut session, "SELECT id FROM users", &[]).expect("retry should succeed");

    assert_eq!(columns, vec![column("id", UUID)]);
    let script = db.script();
    assert_eq!(script.rollbacks, 1);
    assert_eq!(script.probes.len(), 2);
}

#[test]
fn second_probe_failure_is_returned() {
    let db = FakeDatabase::new()
        .with_columns("FROM users", vec![column("id", UUID)])
        .with_probe_failures(2);
    let mut session = db.session();

    let err = resolve_columns(&mut session, "SELECT id FROM users", &[])
        .expect_err("two failures should surface");

    assert_eq!(err.to_string(), "current transaction is aborted");
    let script = db.script();
    assert_eq!(script.rollbacks, 1);
    assert_eq!(script.probes.len(), 2);
}
