use crate::value::TypedValue;
use derive_more::{Deref, DerefMut};

///
/// BindValues
///
/// Positional bind values in emission order. The renderer pushes each value
/// at the moment its `?` is written, which is what keeps textual order and
/// bind order in lockstep.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, PartialEq)]
pub struct BindValues(Vec<TypedValue>);

impl BindValues {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<TypedValue> {
        self.0
    }
}

///
/// LogicalToken
///
/// A bare AND/OR occupying its own slot in a term list. Exists purely so
/// operator tokens can live in the same ordered list as real conditions;
/// it renders only its own text and is always idempotent.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogicalToken {
    And,
    Or,
}

impl LogicalToken {
    #[must_use]
    pub const fn as_cql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

///
/// ColumnTarget
///
/// The left-hand side of a condition: a plain column, or one entry of a
/// map-typed column addressed by a bound key (`column[?]`).
///

#[derive(Clone, Debug, PartialEq)]
pub enum ColumnTarget {
    Plain(String),
    MapEntry { column: String, key: TypedValue },
}

impl ColumnTarget {
    pub fn plain(column: impl Into<String>) -> Self {
        Self::Plain(column.into())
    }

    pub fn map_entry(column: impl Into<String>, key: TypedValue) -> Self {
        Self::MapEntry {
            column: column.into(),
            key,
        }
    }
}

///
/// PredicateOp
///
/// The closed set of relations a condition can render. There is no slot for
/// anything else; unsupported shapes are rejected during compilation, not
/// at render time.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PredicateOp {
    Eq,
    Neq,
    Gt,
    Contains,
    NotContains,
    ContainsKey,
    NotContainsKey,
}

impl PredicateOp {
    /// The textual tail of the condition, bind marker included.
    #[must_use]
    pub const fn fragment(self) -> &'static str {
        match self {
            Self::Eq => "=?",
            Self::Neq => "!=?",
            Self::Gt => ">?",
            Self::Contains => " CONTAINS ?",
            Self::NotContains => " NOT CONTAINS ?",
            Self::ContainsKey => " CONTAINS KEY ?",
            Self::NotContainsKey => " NOT CONTAINS KEY ?",
        }
    }
}

///
/// BuiltCondition
///
/// One renderable condition: it emits its own text and registers its bind
/// values as they appear in that text.
///

#[derive(Clone, Debug, PartialEq)]
pub struct BuiltCondition {
    target: ColumnTarget,
    op: PredicateOp,
    value: TypedValue,
    idempotent: bool,
}

impl BuiltCondition {
    #[must_use]
    pub const fn new(target: ColumnTarget, op: PredicateOp, value: TypedValue) -> Self {
        Self {
            target,
            op,
            value,
            idempotent: true,
        }
    }

    /// Mark this condition non-idempotent; the whole clause inherits it.
    #[must_use]
    pub const fn non_idempotent(mut self) -> Self {
        self.idempotent = false;
        self
    }

    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    /// Convenience equality condition on a plain column.
    pub fn eq(column: impl Into<String>, value: TypedValue) -> Self {
        Self::new(ColumnTarget::plain(column), PredicateOp::Eq, value)
    }

    pub(crate) fn render(&self, out: &mut String, binds: &mut BindValues) {
        match &self.target {
            ColumnTarget::Plain(column) => out.push_str(column),
            ColumnTarget::MapEntry { column, key } => {
                out.push_str(column);
                out.push_str("[?]");
                binds.push(key.clone());
            }
        }

        out.push_str(self.op.fragment());
        binds.push(self.value.clone());
    }
}

///
/// WhereTerm
///
/// One element of the compiler's ordered list: a renderable condition, a
/// bare logical-operator token, or a parenthesized subgroup. The list need
/// not come from a logical-expression tree; lower layers may build it
/// directly, which is the only way an explicitly empty subgroup can exist.
///

#[derive(Clone, Debug, PartialEq)]
pub enum WhereTerm {
    Condition(BuiltCondition),
    Token(LogicalToken),
    Group(Vec<WhereTerm>),
}

impl WhereTerm {
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        match self {
            Self::Condition(condition) => condition.is_idempotent(),
            Self::Token(_) => true,
            Self::Group(members) => members.iter().all(Self::is_idempotent),
        }
    }

    #[must_use]
    pub const fn is_token(&self) -> bool {
        matches!(self, Self::Token(_))
    }
}

impl From<BuiltCondition> for WhereTerm {
    fn from(condition: BuiltCondition) -> Self {
        Self::Condition(condition)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_condition_renders_text_and_bind() {
        let mut out = String::new();
        let mut binds = BindValues::new();

        BuiltCondition::eq("name", TypedValue::from("ice")).render(&mut out, &mut binds);

        assert_eq!(out, "name=?");
        assert_eq!(binds.as_slice(), &[TypedValue::from("ice")]);
    }

    #[test]
    fn map_entry_binds_key_before_value() {
        let mut out = String::new();
        let mut binds = BindValues::new();

        let condition = BuiltCondition::new(
            ColumnTarget::map_entry("array_size", TypedValue::from("tags")),
            PredicateOp::Eq,
            TypedValue::from(3),
        );
        condition.render(&mut out, &mut binds);

        assert_eq!(out, "array_size[?]=?");
        assert_eq!(
            binds.as_slice(),
            &[TypedValue::from("tags"), TypedValue::from(3)]
        );
    }

    #[test]
    fn contains_fragments_are_spaced() {
        let mut out = String::new();
        let mut binds = BindValues::new();

        let condition = BuiltCondition::new(
            ColumnTarget::plain("exist_keys"),
            PredicateOp::NotContains,
            TypedValue::from("address"),
        );
        condition.render(&mut out, &mut binds);

        assert_eq!(out, "exist_keys NOT CONTAINS ?");
    }

    #[test]
    fn idempotence_flags_aggregate_through_groups() {
        let group = WhereTerm::Group(vec![
            WhereTerm::Condition(BuiltCondition::eq("a", TypedValue::from(1))),
            WhereTerm::Token(LogicalToken::And),
            WhereTerm::Condition(
                BuiltCondition::eq("b", TypedValue::from(2)).non_idempotent(),
            ),
        ]);

        assert!(!group.is_idempotent());
        assert!(WhereTerm::Token(LogicalToken::Or).is_idempotent());
    }
}
