use crate::{
    filter::FilterOperator,
    value::{TypedValue, ValueKind},
};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Path wildcard accepted by [`ComparisonExpression::match_ops`].
pub const MATCH_ANY_PATH: &str = "*";

///
/// CollectionTag
///
/// Marks an expression that targets a map/set/list-typed table column.
/// Ordinary document filtering carries no tag. The two worlds share operator
/// syntax, so the tag is what keeps a table-collection filter from being
/// confused with a same-shaped JSON-array filter; a single expression is
/// exclusively one or the other.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionTag {
    Map,
    Set,
    List,
}

///
/// ComparisonOperation
///
/// One operator/operand pair applied to a path.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonOperation {
    pub operator: FilterOperator,
    pub operand: TypedValue,
}

impl ComparisonOperation {
    #[must_use]
    pub const fn new(operator: FilterOperator, operand: TypedValue) -> Self {
        Self { operator, operand }
    }

    /// Whether this operation passes the operator/kind filter.
    ///
    /// Kind comparison is exact equality, not structural compatibility.
    #[must_use]
    pub fn matches(&self, operators: &[FilterOperator], kind: ValueKind) -> bool {
        operators.contains(&self.operator) && self.operand.kind() == kind
    }

    /// The negated form of this operation.
    ///
    /// Operator negation comes from [`FilterOperator::negate`]; the operand
    /// transforms mirror the semantics of the operators that fold their
    /// negation into the operand:
    ///
    /// - `$exists`: the boolean operand flips.
    /// - `$size 0`: "size is not zero" has no negative-zero encoding, so the
    ///   operand becomes boolean `true` (assert non-emptiness).
    /// - `$size n` (n != 0): the operand becomes `-n`; the compiler reads a
    ///   negative size as "not exactly n".
    /// - everything else: operand unchanged.
    #[must_use]
    pub fn invert(&self) -> Self {
        let operator = self.operator.negate();

        let operand = match self.operator {
            FilterOperator::Exists => match self.operand.as_bool() {
                Some(flag) => TypedValue::Bool(!flag),
                None => self.operand.clone(),
            },
            FilterOperator::Size => match self.operand.as_i64() {
                Some(0) => TypedValue::Bool(true),
                Some(n) => TypedValue::Number(Number::from(-n)),
                // Already in the boolean "not empty" form; no reverse
                // mapping is defined for it.
                None => self.operand.clone(),
            },
            _ => self.operand.clone(),
        };

        Self { operator, operand }
    }
}

///
/// ComparisonExpression
///
/// A leaf of the filter tree: one path with one or more operator/operand
/// pairs. Consumed read-only during compilation.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonExpression {
    path: String,
    collection_tag: Option<CollectionTag>,
    operations: Vec<ComparisonOperation>,
}

impl ComparisonExpression {
    /// An expression over a document path, with no operations yet.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            collection_tag: None,
            operations: Vec::new(),
        }
    }

    /// An expression over a map/set/list-typed table column.
    pub fn tagged(path: impl Into<String>, tag: CollectionTag) -> Self {
        Self {
            path: path.into(),
            collection_tag: Some(tag),
            operations: Vec::new(),
        }
    }

    /// Canonical expansion of the shorthand `{"field": value}` into
    /// `{"field": {"$eq": value}}`.
    pub fn eq(path: impl Into<String>, value: TypedValue) -> Self {
        let mut expr = Self::new(path);
        expr.add(FilterOperator::Eq, value);
        expr
    }

    /// Append one more operation on the same path.
    pub fn add(&mut self, operator: FilterOperator, operand: TypedValue) -> &mut Self {
        self.operations.push(ComparisonOperation::new(operator, operand));
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn collection_tag(&self) -> Option<CollectionTag> {
        self.collection_tag
    }

    #[must_use]
    pub fn operations(&self) -> &[ComparisonOperation] {
        &self.operations
    }

    /// Select the operations this expression contributes for a match probe.
    ///
    /// Two-stage gate:
    /// 1. Structural: `applies_to_collection` must agree with the presence of
    ///    the collection tag; a mismatch is "no match", never an error.
    /// 2. Path: `match_path` is [`MATCH_ANY_PATH`] or an exact case-sensitive
    ///    equality with this expression's path.
    ///
    /// Surviving operations are then filtered by operator set and exact
    /// operand kind.
    #[must_use]
    pub fn match_ops(
        &self,
        match_path: &str,
        operators: &[FilterOperator],
        kind: ValueKind,
        applies_to_collection: bool,
    ) -> Vec<&ComparisonOperation> {
        if applies_to_collection != self.collection_tag.is_some() {
            return Vec::new();
        }
        if match_path != MATCH_ANY_PATH && match_path != self.path {
            return Vec::new();
        }

        self.operations
            .iter()
            .filter(|op| op.matches(operators, kind))
            .collect()
    }

    /// The negated form of this expression.
    ///
    /// A pure transform: the receiver is untouched, so an expression shared
    /// from more than one place in a tree can never observe a half-negated
    /// sibling.
    #[must_use]
    pub fn invert(&self) -> Self {
        Self {
            path: self.path.clone(),
            collection_tag: self.collection_tag,
            operations: self.operations.iter().map(ComparisonOperation::invert).collect(),
        }
    }
}

///
/// TESTS
///
