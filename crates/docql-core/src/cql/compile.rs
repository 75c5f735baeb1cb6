use crate::{
    cql::{BindValues, BuiltCondition, ColumnTarget, LogicalToken, PredicateOp, WhereTerm},
    filter::{
        CollectionTag, ComparisonExpression, ComparisonOperation, FilterOperator,
        LogicalExpression, LogicalRelation,
    },
    value::TypedValue,
};
use serde_json::Value as JsonValue;
use thiserror::Error as ThisError;
use tracing::trace;

///
/// Shredded document columns
///
/// Ordinary document filtering lands on the fixed index columns of a
/// document table: per-kind value maps keyed by field path, a key-existence
/// set, an array-size map, and a set of "path value" membership entries.
///

pub const COL_TEXT_VALUES: &str = "query_text_values";
pub const COL_DBL_VALUES: &str = "query_dbl_values";
pub const COL_BOOL_VALUES: &str = "query_bool_values";
pub const COL_TIMESTAMP_VALUES: &str = "query_timestamp_values";
pub const COL_NULL_VALUES: &str = "query_null_values";
pub const COL_EXIST_KEYS: &str = "exist_keys";
pub const COL_ARRAY_SIZE: &str = "array_size";
pub const COL_ARRAY_CONTAINS: &str = "array_contains";
/// Partition key column holding the document id.
pub const COL_DOC_KEY: &str = "key";

///
/// CompileError
///
/// Shapes the condition model has no slot for. Raised while lowering a
/// tree, never at render time.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("operator {token} is not supported on collection column '{column}'")]
    UnsupportedCollectionOperator {
        column: String,
        token: &'static str,
    },

    #[error("operand for {token} on '{path}' has no compilable shape")]
    UncompilableOperand { path: String, token: &'static str },
}

/// Render an ordered term list into WHERE-clause text.
///
/// Elements emit their own text; bind values are pushed in emission order,
/// which must match the textual order for positional binding to hold. A
/// logical-operator token occupies its own slot and is consumed by
/// lookahead; between two conditions with no token, ` AND ` is the implicit
/// default.
pub fn render_where(
    terms: &[WhereTerm],
    is_subgroup: bool,
    out: &mut String,
    binds: &mut BindValues,
) {
    if is_subgroup {
        out.push('(');
    }

    let mut i = 0;
    while i < terms.len() {
        if i == 0 && !is_subgroup {
            out.push_str(" WHERE ");
        }

        match &terms[i] {
            WhereTerm::Condition(condition) => condition.render(out, binds),
            WhereTerm::Token(token) => out.push_str(token.as_cql()),
            WhereTerm::Group(members) => render_where(members, true, out, binds),
        }

        if let Some(WhereTerm::Token(token)) = terms.get(i + 1) {
            out.push(' ');
            out.push_str(token.as_cql());
            out.push(' ');
            i += 2;
        } else {
            if i + 1 < terms.len() {
                out.push_str(" AND ");
            }
            i += 1;
        }
    }

    if is_subgroup {
        out.push(')');
    }
}

/// Whole-clause idempotence: the AND of each term's own flag. Callers use
/// it to decide statement retry-safety.
#[must_use]
pub fn clause_idempotent(terms: &[WhereTerm]) -> bool {
    terms.iter().all(WhereTerm::is_idempotent)
}

/// Lower a logical-expression tree into an ordered term list.
///
/// The tree is compiled exactly as built: comparisons first, then nested
/// groups, in declaration order, with this group's token between elements.
/// A comparison that expands to several conditions is parenthesized inside
/// a disjunction so the implicit ANDs cannot leak precedence.
pub fn compile_expression(expr: &LogicalExpression) -> Result<Vec<WhereTerm>, CompileError> {
    let token = match expr.relation() {
        LogicalRelation::And => LogicalToken::And,
        LogicalRelation::Or => LogicalToken::Or,
    };

    let mut elements: Vec<Vec<WhereTerm>> = Vec::new();

    for comparison in expr.comparisons() {
        let element = compile_comparison(comparison)?;
        if !element.is_empty() {
            elements.push(element);
        }
    }
    for child in expr.children() {
        elements.push(vec![WhereTerm::Group(compile_expression(child)?)]);
    }

    let mut terms = Vec::new();
    for (i, element) in elements.into_iter().enumerate() {
        if i > 0 {
            terms.push(WhereTerm::Token(token));
        }
        if element.len() > 1 && token == LogicalToken::Or {
            terms.push(WhereTerm::Group(element));
        } else {
            terms.extend(element);
        }
    }

    trace!(terms = terms.len(), "compiled logical expression");
    Ok(terms)
}

fn compile_comparison(expr: &ComparisonExpression) -> Result<Vec<WhereTerm>, CompileError> {
    let mut out = Vec::new();

    for operation in expr.operations() {
        let conditions = match expr.collection_tag() {
            Some(tag) => compile_collection_operation(expr.path(), tag, operation)?,
            None => compile_document_operation(expr.path(), operation)?,
        };
        out.extend(conditions.into_iter().map(WhereTerm::Condition));
    }

    Ok(out)
}

///
/// Collection-column lowering
///
/// The expression path names a real map/set/list column; operators lower to
/// the native CONTAINS family. `$exists` and `$size` have no collection
/// form and are rejected here.
///

fn compile_collection_operation(
    column: &str,
    tag: CollectionTag,
    operation: &ComparisonOperation,
) -> Result<Vec<BuiltCondition>, CompileError> {
    let op = operation.operator;

    match op {
        FilterOperator::Eq | FilterOperator::Ne => {
            let predicate = if op == FilterOperator::Eq {
                PredicateOp::Eq
            } else {
                PredicateOp::Neq
            };
            Ok(vec![compile_collection_equality(
                column,
                tag,
                predicate,
                &operation.operand,
            )])
        }

        FilterOperator::All | FilterOperator::NotAny => {
            let TypedValue::Array(items) = &operation.operand else {
                return Err(CompileError::UncompilableOperand {
                    path: column.to_string(),
                    token: op.token(),
                });
            };

            let predicate = match (tag, op) {
                (CollectionTag::Map, FilterOperator::All) => PredicateOp::ContainsKey,
                (CollectionTag::Map, _) => PredicateOp::NotContainsKey,
                (_, FilterOperator::All) => PredicateOp::Contains,
                (_, _) => PredicateOp::NotContains,
            };

            Ok(items
                .iter()
                .map(|item| {
                    BuiltCondition::new(
                        ColumnTarget::plain(column),
                        predicate,
                        TypedValue::of(item),
                    )
                })
                .collect())
        }

        FilterOperator::Exists | FilterOperator::Size => {
            Err(CompileError::UnsupportedCollectionOperator {
                column: column.to_string(),
                token: op.token(),
            })
        }
    }
}

/// Map equality against a `[key, value]` pair addresses one entry
/// (`column[?]`); everything else compares the whole column.
fn compile_collection_equality(
    column: &str,
    tag: CollectionTag,
    predicate: PredicateOp,
    operand: &TypedValue,
) -> BuiltCondition {
    if tag == CollectionTag::Map {
        if let TypedValue::Array(pair) = operand {
            if let [key, value] = pair.as_slice() {
                return BuiltCondition::new(
                    ColumnTarget::map_entry(column, TypedValue::of(key)),
                    predicate,
                    TypedValue::of(value),
                );
            }
        }
    }

    BuiltCondition::new(ColumnTarget::plain(column), predicate, operand.clone())
}

///
/// Document-path lowering
///
/// The expression path is a field path inside a shredded document; every
/// operator lands on one of the fixed index columns.
///

fn compile_document_operation(
    path: &str,
    operation: &ComparisonOperation,
) -> Result<Vec<BuiltCondition>, CompileError> {
    let operand = &operation.operand;

    match operation.operator {
        FilterOperator::Eq => Ok(vec![document_equality(path, PredicateOp::Eq, operand)]),
        FilterOperator::Ne => Ok(vec![document_equality(path, PredicateOp::Neq, operand)]),

        FilterOperator::Exists => {
            let predicate = if operand.as_bool() == Some(true) {
                PredicateOp::Contains
            } else {
                PredicateOp::NotContains
            };
            Ok(vec![BuiltCondition::new(
                ColumnTarget::plain(COL_EXIST_KEYS),
                predicate,
                TypedValue::from(path),
            )])
        }

        FilterOperator::Size => compile_document_size(path, operand).map(|c| vec![c]),

        FilterOperator::All | FilterOperator::NotAny => {
            let TypedValue::Array(items) = operand else {
                return Err(CompileError::UncompilableOperand {
                    path: path.to_string(),
                    token: operation.operator.token(),
                });
            };

            let predicate = if operation.operator == FilterOperator::All {
                PredicateOp::Contains
            } else {
                PredicateOp::NotContains
            };

            Ok(items
                .iter()
                .map(|item| {
                    BuiltCondition::new(
                        ColumnTarget::plain(COL_ARRAY_CONTAINS),
                        predicate,
                        TypedValue::Text(array_entry(path, item)),
                    )
                })
                .collect())
        }
    }
}

fn document_equality(path: &str, predicate: PredicateOp, operand: &TypedValue) -> BuiltCondition {
    let entry = |column: &str, value: TypedValue| {
        BuiltCondition::new(
            ColumnTarget::map_entry(column, TypedValue::from(path)),
            predicate,
            value,
        )
    };

    match operand {
        TypedValue::Text(_) => entry(COL_TEXT_VALUES, operand.clone()),
        TypedValue::Number(_) => entry(COL_DBL_VALUES, operand.clone()),
        TypedValue::Bool(_) => entry(COL_BOOL_VALUES, operand.clone()),
        TypedValue::Date(_) => entry(COL_TIMESTAMP_VALUES, operand.clone()),
        TypedValue::Null => {
            let contains = if predicate == PredicateOp::Neq {
                PredicateOp::NotContains
            } else {
                PredicateOp::Contains
            };
            BuiltCondition::new(
                ColumnTarget::plain(COL_NULL_VALUES),
                contains,
                TypedValue::from(path),
            )
        }
        TypedValue::DocumentId(_) => BuiltCondition::new(
            ColumnTarget::plain(COL_DOC_KEY),
            predicate,
            operand.clone(),
        ),
        TypedValue::SubDocument(map) => entry(
            COL_TEXT_VALUES,
            TypedValue::Text(JsonValue::Object(map.clone()).to_string()),
        ),
        TypedValue::Ejson(map) => entry(
            COL_TEXT_VALUES,
            TypedValue::Text(JsonValue::Object(map.clone()).to_string()),
        ),
        TypedValue::Array(items) => entry(
            COL_TEXT_VALUES,
            TypedValue::Text(JsonValue::Array(items.clone()).to_string()),
        ),
    }
}

/// `$size n` matches an exact array length. The inverted forms read back
/// out of the operand: a negative count means "not exactly |n|", and a
/// boolean `true` asserts non-emptiness.
fn compile_document_size(path: &str, operand: &TypedValue) -> Result<BuiltCondition, CompileError> {
    let target = ColumnTarget::map_entry(COL_ARRAY_SIZE, TypedValue::from(path));

    match operand {
        TypedValue::Number(n) => {
            let Some(count) = n.as_i64() else {
                return Err(CompileError::UncompilableOperand {
                    path: path.to_string(),
                    token: FilterOperator::Size.token(),
                });
            };
            if count < 0 {
                Ok(BuiltCondition::new(
                    target,
                    PredicateOp::Neq,
                    TypedValue::from(-count),
                ))
            } else {
                Ok(BuiltCondition::new(
                    target,
                    PredicateOp::Eq,
                    TypedValue::from(count),
                ))
            }
        }
        TypedValue::Bool(true) => Ok(BuiltCondition::new(
            target,
            PredicateOp::Gt,
            TypedValue::from(0),
        )),
        _ => Err(CompileError::UncompilableOperand {
            path: path.to_string(),
            token: FilterOperator::Size.token(),
        }),
    }
}

/// Membership entries are stored as `"<path> <value>"`; strings go in raw,
/// everything else as compact JSON.
fn array_entry(path: &str, item: &JsonValue) -> String {
    match item {
        JsonValue::String(s) => format!("{path} {s}"),
        other => format!("{path} {other}"),
    }
}

///
/// TESTS
///
