use crate::common::{StubBackend, profiles, row};
use dbrun::backend::ResultRow;
use dbrun::config::ProfileTable;
use dbrun::error::DbrunError;
use dbrun::report::{DOCS_POINTER, error_report, generate_report};
use dbrun::verbose::Verbosity;
use serde_json::json;
use std::path::PathBuf;

async fn report_for(
    input: &str,
    backend: &StubBackend,
    profiles: Result<ProfileTable, DbrunError>,
) -> Vec<String> {
    generate_report(input, 40, &profiles, backend, &Verbosity::quiet()).await
}

#[tokio::test]
async fn multi_statement_stream_renders_one_table_per_group() {
    let backend = StubBackend::new(vec![Ok(vec![
        row(&[("test1", "a")]),
        row(&[("test1", "c")]),
        row(&[("test2", "b")]),
        row(&[("test1", "d")]),
    ])]);
    let input = "
        SELECT 'a' test1
        SELECT 'c' test1
        SELECT 'b' test2
        SELECT 'd' test1
    ";
    let lines = report_for(input, &backend, Ok(profiles())).await;

    assert_eq!(
        lines,
        vec![
            "=== QUERY RESULT ===",
            "",
            " # test1",
            "-- -----",
            "#0 a",
            "#1 c",
            "",
            " # test2",
            "-- -----",
            "#0 b",
            "",
            " # test1",
            "-- -----",
            "#0 d",
            "",
            "",
        ]
    );

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].0,
        "SELECT 'a' test1\nSELECT 'c' test1\nSELECT 'b' test2\nSELECT 'd' test1"
    );
    assert_eq!(calls[0].1, "main");
}

#[tokio::test]
async fn csv_directive_renders_csv_block() {
    let backend = StubBackend::new(vec![Ok(vec![row(&[("col1", "First"), ("col2", "Second")])])]);
    let input = "--> {\"output\":\"csv\",\"title\":\"try CSV\"}\nSELECT 'First' col1, 'Second' col2";
    let lines = report_for(input, &backend, Ok(profiles())).await;

    assert_eq!(
        lines,
        vec!["=== try CSV ===", "", "\"col1\",\"col2\"", "\"First\",\"Second\"", "", ""]
    );
}

#[tokio::test]
async fn every_format_in_one_document() {
    let pair = || vec![row(&[("col1", "First"), ("col2", "Second")])];
    let id_rows: Vec<ResultRow> = vec![
        [("id".to_string(), json!(1)), ("value".to_string(), json!("First"))]
            .into_iter()
            .collect(),
        [("id".to_string(), json!(2)), ("value".to_string(), json!("Second"))]
            .into_iter()
            .collect(),
    ];
    let backend = StubBackend::new(vec![Ok(id_rows), Ok(pair()), Ok(pair()), Ok(pair())]);

    let input = r#"
        -->
        -- example of empty command: { "db": "default", "output": "vizualize" }
        DECLARE @temp TABLE (id int, value varchar(20))

        INSERT INTO @temp(id, value)
        VALUES (1, 'First'), (2, 'Second')

        SELECT * FROM @temp

        --> { "db": "anotherLabel", "output": "markdown", "title": "try Markdown" }

        SELECT 'First' col1, 'Second' col2

        --> { "db": "anotherLabel", "output": "csv", "title": "try CSV" }

        SELECT 'First' col1, 'Second' col2

        --> { "db": "anotherLabel", "output": "json", "title": "try JSON" }

        SELECT 'First' col1, 'Second' col2
    "#;
    let lines = report_for(input, &backend, Ok(profiles())).await;

    let expected = vec![
        "=== QUERY RESULT ===",
        "",
        " # id value",
        "-- -- -------",
        "#0 1  First",
        "#1 2  Second",
        "",
        "",
        "### try Markdown",
        "",
        "col1 | col2",
        ":-- | :--",
        "First | Second",
        "",
        "",
        "=== try CSV ===",
        "",
        "\"col1\",\"col2\"",
        "\"First\",\"Second\"",
        "",
        "",
        "/* === try JSON === */",
        "[",
        "    {",
        "        \"col1\": \"First\",",
        "        \"col2\": \"Second\"",
        "    }",
        "]",
        "",
        "",
    ];
    assert_eq!(lines, expected);

    let databases: Vec<String> = backend.calls().into_iter().map(|(_, db)| db).collect();
    assert_eq!(databases, vec!["main", "other", "other", "other"]);
}

#[tokio::test]
async fn failed_job_is_reported_in_place_and_the_batch_continues() {
    let backend = StubBackend::new(vec![
        Err(DbrunError::Query {
            message: "Invalid column name 'x'.\nStatement(s) could not be prepared.".to_string(),
        }),
        Ok(vec![row(&[("a", "1")])]),
    ]);
    let input = "SELECT x\n--> {\"output\": \"md\"}\nSELECT 1 a";
    let lines = report_for(input, &backend, Ok(profiles())).await;

    assert_eq!(
        lines,
        vec![
            "query: Invalid column name 'x'.",
            "Statement(s) could not be prepared.",
            "",
            "",
            "### QUERY RESULT",
            "",
            "a",
            ":--",
            "1",
            "",
            "",
        ]
    );
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn jobs_run_in_source_order() {
    let backend = StubBackend::new(vec![
        Ok(vec![row(&[("n", "1")])]),
        Ok(vec![row(&[("n", "2")])]),
        Ok(vec![row(&[("n", "3")])]),
    ]);
    let input = "SELECT 1\n-->\nSELECT 2\n-->\nSELECT 3";
    let lines = report_for(input, &backend, Ok(profiles())).await;

    let sqls: Vec<String> = backend.calls().into_iter().map(|(sql, _)| sql).collect();
    assert_eq!(sqls, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);

    let values: Vec<&String> = lines.iter().filter(|l| l.starts_with("#0")).collect();
    assert_eq!(values, vec!["#0 1", "#0 2", "#0 3"]);
}

#[tokio::test]
async fn empty_result_renders_empty_marker() {
    let backend = StubBackend::new(vec![Ok(Vec::new())]);
    let lines = report_for("UPDATE t SET a = 1", &backend, Ok(profiles())).await;
    assert_eq!(lines, vec!["=== QUERY RESULT ===", "", "(empty)", "", ""]);
}

#[tokio::test]
async fn no_jobs_produce_an_empty_report() {
    let backend = StubBackend::new(Vec::new());
    let lines = report_for("\n\n-->\n", &backend, Ok(profiles())).await;
    assert!(lines.is_empty());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn missing_config_short_circuits_regardless_of_input() {
    for input in ["SELECT 1", "", "--> {\"output\": \"csv\"}\nSELECT 2"] {
        let backend = StubBackend::new(vec![Ok(vec![row(&[("a", "1")])])]);
        let missing = Err(DbrunError::ConfigMissing {
            path: PathBuf::from("/home/me/.config/dbrun/profiles.json"),
        });
        let lines = report_for(input, &backend, missing).await;

        assert_eq!(
            lines,
            vec![
                "Please create a profile file at /home/me/.config/dbrun/profiles.json".to_string(),
                String::new(),
                DOCS_POINTER.to_string(),
            ]
        );
        assert!(backend.calls().is_empty());
    }
}

#[tokio::test]
async fn invalid_config_short_circuits_with_its_own_message() {
    let backend = StubBackend::new(Vec::new());
    let invalid = ProfileTable::from_json(r#"{"default": {"client": "db2"}}"#);
    assert!(invalid.is_err());

    let lines = report_for("SELECT 1", &backend, invalid).await;
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("The profile file has a bad configuration"));
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], DOCS_POINTER);
    assert!(backend.calls().is_empty());
}

#[test]
fn error_report_messages_differ_by_kind() {
    let missing = error_report(&DbrunError::ConfigMissing {
        path: PathBuf::from("p.json"),
    });
    let invalid = error_report(&DbrunError::ConfigInvalid {
        message: "profile 'default': missing connection.host".to_string(),
    });
    assert_ne!(missing[0], invalid[0]);
    assert!(invalid[0].contains("missing connection.host"));
}
