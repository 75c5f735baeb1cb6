use crate::filter::ComparisonExpression;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// LogicalRelation
///
/// The connective of a filter group. Fixed at construction.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalRelation {
    And,
    Or,
}

impl LogicalRelation {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }
}

impl fmt::Display for LogicalRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::And => "AND",
            Self::Or => "OR",
        };
        write!(f, "{label}")
    }
}

///
/// LogicalExpression
///
/// An AND/OR node over comparison expressions and nested groups. One root is
/// built per request and discarded after compilation; there is no
/// rebalancing, flattening, or simplification. The order of children and
/// comparisons fixes parenthesis order and positional bind order in the
/// compiled output.
///

#[derive(Clone, Debug, PartialEq)]
pub struct LogicalExpression {
    relation: LogicalRelation,
    children: Vec<LogicalExpression>,
    comparisons: Vec<ComparisonExpression>,
}

impl LogicalExpression {
    /// An empty conjunction group.
    #[must_use]
    pub const fn and() -> Self {
        Self {
            relation: LogicalRelation::And,
            children: Vec::new(),
            comparisons: Vec::new(),
        }
    }

    /// An empty disjunction group.
    #[must_use]
    pub const fn or() -> Self {
        Self {
            relation: LogicalRelation::Or,
            children: Vec::new(),
            comparisons: Vec::new(),
        }
    }

    #[must_use]
    pub const fn relation(&self) -> LogicalRelation {
        self.relation
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    #[must_use]
    pub fn comparisons(&self) -> &[ComparisonExpression] {
        &self.comparisons
    }

    /// No comparisons and no nested children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.comparisons.is_empty()
    }

    /// Append a nested group.
    ///
    /// Empty children are dropped silently so vacuous `()` groups can never
    /// reach the compiler through the tree. (Lower layers that build term
    /// lists directly can still emit explicit empty groups.)
    pub fn add_logical_expression(&mut self, child: Self) -> &mut Self {
        if !child.is_empty() {
            self.children.push(child);
        }
        self
    }

    /// Append a comparison. Unconditional.
    pub fn add_comparison_expression(&mut self, comparison: ComparisonExpression) -> &mut Self {
        self.comparisons.push(comparison);
        self
    }

    /// The negated form of this tree: De Morgan pushdown.
    ///
    /// The relation flips, and every comparison and child is negated
    /// recursively. A pure transform over a fresh tree.
    #[must_use]
    pub fn invert(&self) -> Self {
        Self {
            relation: self.relation.flipped(),
            children: self.children.iter().map(Self::invert).collect(),
            comparisons: self
                .comparisons
                .iter()
                .map(ComparisonExpression::invert)
                .collect(),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filter::FilterOperator, value::TypedValue};

    #[test]
    fn empty_children_are_dropped() {
        let mut root = LogicalExpression::and();
        root.add_logical_expression(LogicalExpression::or());

        assert_eq!(root.children().len(), 0);
        assert!(root.is_empty());
    }

    #[test]
    fn non_empty_children_are_kept_in_order() {
        let mut first = LogicalExpression::or();
        first.add_comparison_expression(ComparisonExpression::eq("a", TypedValue::from(1)));
        let mut second = LogicalExpression::or();
        second.add_comparison_expression(ComparisonExpression::eq("b", TypedValue::from(2)));

        let mut root = LogicalExpression::and();
        root.add_logical_expression(first);
        root.add_logical_expression(LogicalExpression::and());
        root.add_logical_expression(second);

        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].comparisons()[0].path(), "a");
        assert_eq!(root.children()[1].comparisons()[0].path(), "b");
    }

    #[test]
    fn comparisons_append_unconditionally() {
        let mut root = LogicalExpression::or();
        root.add_comparison_expression(ComparisonExpression::new("empty"));

        assert_eq!(root.comparisons().len(), 1);
    }

    #[test]
    fn invert_applies_de_morgan() {
        let mut inner = LogicalExpression::or();
        inner.add_comparison_expression(ComparisonExpression::eq("b", TypedValue::from(2)));

        let mut root = LogicalExpression::and();
        root.add_comparison_expression(ComparisonExpression::eq("a", TypedValue::from(1)));
        root.add_logical_expression(inner);

        let inverted = root.invert();

        assert_eq!(inverted.relation(), LogicalRelation::Or);
        assert_eq!(inverted.children()[0].relation(), LogicalRelation::And);
        assert_eq!(
            inverted.comparisons()[0].operations()[0].operator,
            FilterOperator::Ne
        );
        assert_eq!(
            inverted.children()[0].comparisons()[0].operations()[0].operator,
            FilterOperator::Ne
        );
        // Double negation restores the original tree.
        assert_eq!(inverted.invert(), root);
    }
}
