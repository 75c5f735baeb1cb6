use crate::{
    MAX_FILTER_DEPTH,
    filter::{
        ComparisonExpression, FilterError, FilterOperator, LogicalExpression, resolve_operator,
    },
    value::{EJSON_DATE_KEY, TypedValue},
};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, trace};

///
/// Filter resolution
///
/// The wire layer hands this module parsed filter clauses: paths, operator
/// tokens, and literal JSON values, optionally grouped under `$and`, `$or`,
/// and `$not`. Resolution assembles one logical-expression tree per request,
/// top-down, applying `$not` as De Morgan pushdown through the pure
/// `invert()` transforms.
///

/// Resolve one `(path, operator token, value)` triple into a
/// single-operation comparison expression.
pub fn resolve_comparison(
    path: &str,
    token: &str,
    value: &JsonValue,
) -> Result<ComparisonExpression, FilterError> {
    let operator = resolve_operator(token)?;
    let operand = resolve_operand(path, operator, value)?;

    let mut expr = ComparisonExpression::new(path);
    expr.add(operator, operand);
    Ok(expr)
}

/// Resolve a whole filter clause into its logical-expression tree.
///
/// The root is always present, even for an empty clause. Sibling entries of
/// one JSON object are an implicit conjunction.
pub fn resolve_filter(clause: &Map<String, JsonValue>) -> Result<LogicalExpression, FilterError> {
    let mut root = LogicalExpression::and();
    resolve_entries(clause, &mut root, 0)?;

    debug!(
        comparisons = root.comparisons().len(),
        groups = root.children().len(),
        "resolved filter clause"
    );
    Ok(root)
}

fn resolve_entries(
    clause: &Map<String, JsonValue>,
    group: &mut LogicalExpression,
    depth: usize,
) -> Result<(), FilterError> {
    if depth > MAX_FILTER_DEPTH {
        return Err(FilterError::TooDeeplyNested {
            max: MAX_FILTER_DEPTH,
        });
    }

    for (key, value) in clause {
        match key.as_str() {
            "$and" => {
                let child = resolve_group(key, value, LogicalExpression::and(), depth)?;
                group.add_logical_expression(child);
            }
            "$or" => {
                let child = resolve_group(key, value, LogicalExpression::or(), depth)?;
                group.add_logical_expression(child);
            }
            "$not" => {
                let JsonValue::Object(inner) = value else {
                    return Err(FilterError::MalformedNegation);
                };
                let mut sub = LogicalExpression::and();
                resolve_entries(inner, &mut sub, depth + 1)?;
                trace!(depth, "pushing negation down");
                group.add_logical_expression(sub.invert());
            }
            token if token.starts_with('$') => {
                return Err(FilterError::UnsupportedFilterOperator {
                    token: token.to_string(),
                });
            }
            path => {
                group.add_comparison_expression(resolve_path_entry(path, value)?);
            }
        }
    }

    Ok(())
}

fn resolve_group(
    token: &str,
    value: &JsonValue,
    mut child: LogicalExpression,
    depth: usize,
) -> Result<LogicalExpression, FilterError> {
    let members = match value {
        JsonValue::Array(members) if !members.is_empty() => members,
        _ => {
            return Err(FilterError::MalformedGroup {
                token: token.to_string(),
            });
        }
    };

    for member in members {
        let JsonValue::Object(entries) = member else {
            return Err(FilterError::MalformedGroup {
                token: token.to_string(),
            });
        };

        if entries.len() == 1 {
            // A single-entry member sits directly in the group.
            resolve_entries(entries, &mut child, depth + 1)?;
        } else {
            // A multi-entry member is its own conjunction.
            let mut nested = LogicalExpression::and();
            resolve_entries(entries, &mut nested, depth + 1)?;
            child.add_logical_expression(nested);
        }
    }

    Ok(child)
}

/// Resolve one `path: value` entry.
///
/// An object value whose keys are operator tokens is an operation list; a
/// lone `$date` wrapper and every non-operator value are equality shorthand.
fn resolve_path_entry(path: &str, value: &JsonValue) -> Result<ComparisonExpression, FilterError> {
    if let JsonValue::Object(map) = value {
        if is_operation_map(map) {
            let mut expr = ComparisonExpression::new(path);
            for (token, operand) in map {
                let operator = resolve_operator(token)?;
                expr.add(operator, resolve_operand(path, operator, operand)?);
            }
            return Ok(expr);
        }
        if map.keys().any(|k| k.starts_with('$')) && !is_ejson_literal(map) {
            return Err(FilterError::MalformedClause {
                path: path.to_string(),
            });
        }
    }

    Ok(ComparisonExpression::eq(path, TypedValue::of(value)))
}

/// Every key is an operator token, and the map is not a lone EJSON literal.
fn is_operation_map(map: &Map<String, JsonValue>) -> bool {
    !map.is_empty() && !is_ejson_literal(map) && map.keys().all(|k| k.starts_with('$'))
}

fn is_ejson_literal(map: &Map<String, JsonValue>) -> bool {
    map.len() == 1 && map.contains_key(EJSON_DATE_KEY)
}

fn resolve_operand(
    path: &str,
    operator: FilterOperator,
    value: &JsonValue,
) -> Result<TypedValue, FilterError> {
    let operand = TypedValue::of(value);

    match operator {
        FilterOperator::Exists => {
            if operand.as_bool().is_none() {
                return Err(FilterError::InvalidOperand {
                    path: path.to_string(),
                    token: operator.token(),
                    expected: "a boolean",
                });
            }
        }
        FilterOperator::Size => {
            if !operand.as_i64().is_some_and(|n| n >= 0) {
                return Err(FilterError::InvalidOperand {
                    path: path.to_string(),
                    token: operator.token(),
                    expected: "a non-negative integer",
                });
            }
        }
        FilterOperator::All => {
            if !matches!(operand, TypedValue::Array(ref items) if !items.is_empty()) {
                return Err(FilterError::InvalidOperand {
                    path: path.to_string(),
                    token: operator.token(),
                    expected: "a non-empty array",
                });
            }
        }
        FilterOperator::Eq | FilterOperator::Ne | FilterOperator::NotAny => {}
    }

    Ok(operand)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filter::LogicalRelation, value::ValueKind};
    use serde_json::json;

    fn clause(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            other => panic!("expected object clause, got {other}"),
        }
    }

    #[test]
    fn shorthand_equals_explicit_eq() {
        let short = resolve_filter(&clause(json!({"name": "ice"}))).expect("shorthand");
        let explicit =
            resolve_filter(&clause(json!({"name": {"$eq": "ice"}}))).expect("explicit");

        assert_eq!(short, explicit);
        assert_eq!(
            short.comparisons()[0].operations()[0].operator,
            FilterOperator::Eq
        );
    }

    #[test]
    fn root_is_present_for_empty_clause() {
        let root = resolve_filter(&Map::new()).expect("empty clause");

        assert_eq!(root.relation(), LogicalRelation::And);
        assert!(root.is_empty());
    }

    #[test]
    fn compound_operations_share_one_path() {
        let root = resolve_filter(&clause(json!({
            "tags": {"$exists": true, "$size": 2}
        })))
        .expect("compound");

        let ops = root.comparisons()[0].operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].operator, FilterOperator::Exists);
        assert_eq!(ops[1].operator, FilterOperator::Size);
    }

    #[test]
    fn or_group_nests_multi_entry_members() {
        let root = resolve_filter(&clause(json!({
            "$or": [{"a": 1}, {"b": 2, "c": 3}]
        })))
        .expect("or group");

        let or = &root.children()[0];
        assert_eq!(or.relation(), LogicalRelation::Or);
        assert_eq!(or.comparisons().len(), 1);
        assert_eq!(or.children().len(), 1);
        assert_eq!(or.children()[0].relation(), LogicalRelation::And);
        assert_eq!(or.children()[0].comparisons().len(), 2);
    }

    #[test]
    fn not_pushes_negation_onto_leaves() {
        let root = resolve_filter(&clause(json!({
            "$not": {"$or": [{"a": 1}, {"b": {"$exists": true}}]}
        })))
        .expect("negated clause");

        // NOT(OR(a=1, exists(b))) == AND(NOT(a=1), NOT(exists(b)))
        let outer = &root.children()[0];
        assert_eq!(outer.relation(), LogicalRelation::Or);
        let group = &outer.children()[0];
        assert_eq!(group.relation(), LogicalRelation::And);
        assert_eq!(
            group.comparisons()[0].operations()[0].operator,
            FilterOperator::Ne
        );
        assert_eq!(
            group.comparisons()[1].operations()[0].operator,
            FilterOperator::Exists
        );
        assert_eq!(
            group.comparisons()[1].operations()[0].operand,
            TypedValue::Bool(false)
        );
    }

    #[test]
    fn unknown_operator_fails_without_partial_result() {
        let err = resolve_filter(&clause(json!({"f": {"$bogus": 1}}))).unwrap_err();

        assert_eq!(
            err,
            FilterError::UnsupportedFilterOperator {
                token: "$bogus".to_string()
            }
        );
    }

    #[test]
    fn unknown_group_token_fails() {
        let err = resolve_filter(&clause(json!({"$nor": [{"a": 1}]}))).unwrap_err();

        assert_eq!(
            err,
            FilterError::UnsupportedFilterOperator {
                token: "$nor".to_string()
            }
        );
    }

    #[test]
    fn internal_tokens_stay_unresolvable() {
        let err = resolve_filter(&clause(json!({"f": {"$notany": [1]}}))).unwrap_err();

        assert!(matches!(
            err,
            FilterError::UnsupportedFilterOperator { .. }
        ));
    }

    #[test]
    fn ejson_date_is_equality_shorthand() {
        let root = resolve_filter(&clause(json!({
            "created": {"$date": 1_672_531_200_000_i64}
        })))
        .expect("date shorthand");

        let op = &root.comparisons()[0].operations()[0];
        assert_eq!(op.operator, FilterOperator::Eq);
        assert_eq!(op.operand.kind(), ValueKind::Date);
    }

    #[test]
    fn mixed_operator_and_field_keys_fail() {
        let err = resolve_filter(&clause(json!({"f": {"$eq": 1, "g": 2}}))).unwrap_err();

        assert_eq!(
            err,
            FilterError::MalformedClause {
                path: "f".to_string()
            }
        );
    }

    #[test]
    fn operand_shapes_are_validated() {
        let exists = resolve_comparison("f", "$exists", &json!(1)).unwrap_err();
        let size = resolve_comparison("f", "$size", &json!(-1)).unwrap_err();
        let all = resolve_comparison("f", "$all", &json!([])).unwrap_err();

        assert!(matches!(exists, FilterError::InvalidOperand { .. }));
        assert!(matches!(size, FilterError::InvalidOperand { .. }));
        assert!(matches!(all, FilterError::InvalidOperand { .. }));
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let mut value = json!({"a": 1});
        for _ in 0..=MAX_FILTER_DEPTH {
            value = json!({"$not": value});
        }

        let err = resolve_filter(&clause(value)).unwrap_err();

        assert_eq!(
            err,
            FilterError::TooDeeplyNested {
                max: MAX_FILTER_DEPTH
            }
        );
    }

    #[test]
    fn empty_group_array_is_malformed() {
        let err = resolve_filter(&clause(json!({"$or": []}))).unwrap_err();

        assert_eq!(
            err,
            FilterError::MalformedGroup {
                token: "$or".to_string()
            }
        );
    }
}
