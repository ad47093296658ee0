mod support;

use std::path::Path;

use pgtyped::error::{GenerateError, ParseError};
use pgtyped::generator::pipeline::load_queries;
use pgtyped::parser::query_file::{parse_queries, QueryShape};
use support::{fixture_path, read_fixture};

fn load_fixture(name: &str) -> Result<Vec<pgtyped::parser::query_file::Query>, GenerateError> {
    load_queries(&read_fixture(name), &fixture_path(name))
}

#[test]
fn markers_split_the_file_in_order_and_skip_the_preamble() {
    let queries = load_fixture("users.sql").expect("fixture should parse");

    let summary: Vec<(&str, QueryShape)> = queries
        .iter()
        .map(|q| (q.name.as_str(), q.shape))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("get_user", QueryShape::Single),
            ("delete_user", QueryShape::Multi),
            ("count_users", QueryShape::Single),
            ("recent_users", QueryShape::Multi),
        ]
    );
    assert_eq!(queries[0].sql, "SELECT id, email FROM users WHERE id = :id");
    assert!(queries.iter().all(|q| !q.sql.contains("search_path")));
}

#[test]
fn multi_line_bodies_keep_inner_layout() {
    let queries = load_fixture("users.sql").expect("fixture should parse");
    assert_eq!(
        queries[3].sql,
        "SELECT id, email, created_at\nFROM users\nWHERE created_at >= :since AND email ILIKE :pattern\nORDER BY created_at DESC"
    );
}

#[test]
fn second_marker_without_query_type_defaults_to_multi() {
    let text = "/* name=one query_type=single */ SELECT 1;\n/* name=two */ SELECT 2;";
    let queries = parse_queries(text).expect("text should parse");
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].shape, QueryShape::Single);
    assert_eq!(queries[1].shape, QueryShape::Multi);
}

#[test]
fn file_without_markers_is_one_multi_query_named_after_the_file() {
    let queries = load_fixture("no_markers.sql").expect("fixture should parse");
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].name, "no_markers");
    assert_eq!(queries[0].shape, QueryShape::Multi);
    assert_eq!(queries[0].sql, "SELECT id, email FROM users ORDER BY id");
}

#[test]
fn unnamed_markers_get_positional_names() {
    let queries = load_fixture("unnamed.sql").expect("fixture should parse");
    let names: Vec<&str> = queries.iter().map(|q| q.name.as_str()).collect();
    assert_eq!(names, vec!["unnamed_1", "unnamed_2"]);
    assert_eq!(queries[0].shape, QueryShape::Single);
}

#[test]
fn markers_with_empty_bodies_leave_no_queries() {
    let err = load_fixture("empty_markers.sql").expect_err("empty bodies should be rejected");
    assert!(
        matches!(
            err,
            GenerateError::Parse {
                source: ParseError::NoQueries,
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn blank_input_has_no_queries() {
    assert_eq!(parse_queries("  \n\t\n"), Err(ParseError::NoQueries));
}

#[test]
fn unknown_query_type_is_a_parse_error() {
    let err = load_queries("/* name=a query_type=many */ SELECT 1", Path::new("q.sql"))
        .expect_err("unknown query_type should fail");
    assert_eq!(
        err.to_string(),
        "q.sql: unknown query_type 'many' (expected 'single' or 'multi')"
    );
}

#[test]
fn repeated_query_names_are_rejected() {
    let err = load_fixture("duplicate_names.sql").expect_err("duplicate names should fail");
    match err {
        GenerateError::DuplicateQueryName { name, previous } => {
            assert_eq!(name, "get_user");
            assert_eq!(previous, "get_user");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn names_colliding_through_their_record_type_are_rejected() {
    let text = "/* name=get_user */ SELECT 1;\n/* name=get_User */ SELECT 2;";
    let err = load_queries(text, Path::new("q.sql")).expect_err("record names collide");
    assert!(
        matches!(err, GenerateError::DuplicateQueryName { ref name, .. } if name == "GetUserRow"),
        "{err}"
    );
}

#[test]
fn query_names_shadowing_generated_imports_are_rejected() {
    let text = "/* name=text query_type=single */ SELECT 1;\n/* name=other */ SELECT 2;";
    let err = load_queries(text, Path::new("q.sql")).expect_err("`text` shadows the import");
    assert!(
        matches!(err, GenerateError::ReservedQueryName { ref name } if name == "text"),
        "{err}"
    );

    for name in ["uuid", "datetime", "dataclass", "Any", "List"] {
        let text = format!("/* name={name} */ SELECT 1");
        assert!(
            load_queries(&text, Path::new("q.sql")).is_err(),
            "{name} should be rejected"
        );
    }
}

#[test]
fn python_keyword_query_names_are_rejected() {
    let err = load_queries("/* name=class */ SELECT 1", Path::new("q.sql"))
        .expect_err("keywords cannot be function names");
    assert_eq!(
        err.to_string(),
        "query name 'class' is a Python keyword or a name the generated module uses"
    );
}

#[test]
fn default_names_from_reserved_file_stems_are_rejected() {
    let err = load_queries("SELECT 1", Path::new("text.sql")).expect_err("stem shadows `text`");
    assert!(matches!(err, GenerateError::ReservedQueryName { .. }), "{err}");
}

#[test]
fn non_identifier_name_directive_is_a_parse_error() {
    let err = load_queries("/* name = get-user */ SELECT 1", Path::new("q.sql"))
        .expect_err("hyphenated names are not identifiers");
    assert_eq!(
        err.to_string(),
        "q.sql: invalid query name 'get-user' (expected letters, digits and underscores)"
    );
}
