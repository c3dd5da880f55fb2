use crate::common::row;
use dbrun::backend::{ResultRow, display_value, group, signature};
use serde_json::{Value, json};

#[test]
fn heterogeneous_stream_splits_on_signature_change() {
    let rows = vec![
        row(&[("test1", "a")]),
        row(&[("test1", "c")]),
        row(&[("test2", "b")]),
        row(&[("test1", "d")]),
    ];
    let groups = group(rows);

    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].columns, vec!["test1"]);
    assert_eq!(groups[0].rows.len(), 2);
    assert_eq!(groups[1].columns, vec!["test2"]);
    assert_eq!(groups[1].rows.len(), 1);
    assert_eq!(groups[2].columns, vec!["test1"]);
    assert_eq!(groups[2].rows[0]["test1"], "d");
}

#[test]
fn concatenated_groups_reproduce_the_input() {
    let rows = vec![
        row(&[("a", "1"), ("b", "2")]),
        row(&[("a", "3"), ("b", "4")]),
        row(&[("b", "5"), ("c", "6")]),
        row(&[("a", "7"), ("b", "8")]),
        row(&[("a", "9"), ("b", "10")]),
    ];
    let groups = group(rows.clone());

    let flattened: Vec<ResultRow> = groups.iter().flat_map(|g| g.rows.clone()).collect();
    assert_eq!(flattened, rows);

    for g in &groups {
        for r in &g.rows {
            assert_eq!(signature(r), g.columns);
        }
    }
    for pair in groups.windows(2) {
        assert_ne!(pair[0].columns, pair[1].columns);
    }
}

#[test]
fn column_order_is_part_of_the_signature() {
    let rows = vec![row(&[("a", "1"), ("b", "2")]), row(&[("b", "3"), ("a", "4")])];
    let groups = group(rows);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1].columns, vec!["b", "a"]);
}

#[test]
fn empty_rows_produce_no_groups() {
    assert!(group(Vec::new()).is_empty());
}

#[test]
fn display_value_stringifies_cells() {
    assert_eq!(display_value(&json!("text")), "text");
    assert_eq!(display_value(&Value::Null), "NULL");
    assert_eq!(display_value(&json!(42)), "42");
    assert_eq!(display_value(&json!(1.5)), "1.5");
    assert_eq!(display_value(&json!(true)), "true");
}
