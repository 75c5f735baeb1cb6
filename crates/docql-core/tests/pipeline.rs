//! End-to-end checks over the public surface: wire clause in, rendered
//! WHERE text and positional binds out.

use docql_core::{
    cql::{
        BindValues, BuiltCondition, LogicalToken, SelectStatement, WhereTerm,
        compile_expression, render_where,
    },
    filter::{FilterError, resolve_filter},
    value::TypedValue,
};
use serde_json::json;

fn clause(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object clause, got {other}"),
    }
}

fn render(clause_value: serde_json::Value) -> (String, BindValues) {
    let tree = resolve_filter(&clause(clause_value)).expect("resolve");
    let terms = compile_expression(&tree).expect("compile");

    let mut out = String::new();
    let mut binds = BindValues::new();
    render_where(&terms, false, &mut out, &mut binds);
    (out, binds)
}

#[test]
fn conjunction_of_paths_renders_flat() {
    let (out, binds) = render(json!({"a": "x", "b": "y"}));

    assert_eq!(
        out,
        " WHERE query_text_values[?]=? AND query_text_values[?]=?"
    );
    assert_eq!(binds.len(), 4);
}

#[test]
fn nested_negated_disjunction_round_trips() {
    // NOT(a=1 OR (b exists AND c=true))
    let (out, binds) = render(json!({
        "$not": {"$or": [
            {"a": 1},
            {"b": {"$exists": true}, "c": true}
        ]}
    }));

    // One paren pair for the pushed-down OR root, one for its AND member.
    assert_eq!(
        out,
        " WHERE ((query_dbl_values[?]!=? AND \
         (exist_keys NOT CONTAINS ? OR query_bool_values[?]!=?)))"
    );
    assert_eq!(binds.len(), 5);
    assert_eq!(binds[2], TypedValue::from("b"));
}

#[test]
fn double_negation_restores_the_rendering() {
    let source = clause(json!({
        "$or": [{"a": 1}, {"tags": {"$size": 3}}]
    }));
    let tree = resolve_filter(&source).expect("resolve");

    let direct = compile_expression(&tree).expect("compile");
    let doubled = compile_expression(&tree.invert().invert()).expect("compile");

    assert_eq!(direct, doubled);
}

#[test]
fn statement_embeds_the_compiled_clause() {
    let tree = resolve_filter(&clause(json!({"name": "ice"}))).expect("resolve");
    let terms = compile_expression(&tree).expect("compile");

    let rendered = SelectStatement::from_table("app", "docs")
        .columns(["key"])
        .expect("columns")
        .where_terms(terms)
        .expect("where")
        .limit(1)
        .render();

    assert_eq!(
        rendered.cql,
        "SELECT key FROM app.docs WHERE query_text_values[?]=? LIMIT 1"
    );
    assert!(rendered.idempotent);
}

#[test]
fn hand_built_term_lists_and_tree_output_compose() {
    // Table-filter layers splice tree output into hand-built lists; the
    // renderer treats both the same.
    let tree = resolve_filter(&clause(json!({"a": "x"}))).expect("resolve");
    let compiled = compile_expression(&tree).expect("compile");

    let terms = vec![
        WhereTerm::Condition(BuiltCondition::eq("tenant", TypedValue::from("t1"))),
        WhereTerm::Token(LogicalToken::And),
        WhereTerm::Group(compiled),
    ];

    let mut out = String::new();
    let mut binds = BindValues::new();
    render_where(&terms, false, &mut out, &mut binds);

    assert_eq!(out, " WHERE tenant=? AND (query_text_values[?]=?)");
    assert_eq!(binds[0], TypedValue::from("t1"));
}

#[test]
fn resolver_failures_are_synchronous_and_typed() {
    let err = resolve_filter(&clause(json!({"f": {"$regex": ".*"}}))).unwrap_err();

    assert_eq!(
        err,
        FilterError::UnsupportedFilterOperator {
            token: "$regex".to_string()
        }
    );
}
