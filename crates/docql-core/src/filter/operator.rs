use crate::filter::FilterError;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, sync::LazyLock};

///
/// FilterOperator
///
/// Closed set of comparison operators. Each operator knows its wire token
/// and its logical negation; operand transforms that accompany negation
/// (`$exists`, `$size`) live on [`super::ComparisonOperation`].
///
/// `Ne` and `NotAny` exist only as negation counterparts of `Eq` and `All`;
/// they are excluded from the wire registry and can never be resolved from
/// user input.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Ne,
    Exists,
    All,
    NotAny,
    Size,
}

impl FilterOperator {
    /// Every variant, in declaration order. Registry construction iterates
    /// this exactly once.
    pub const ALL: [Self; 6] = [
        Self::Eq,
        Self::Ne,
        Self::Exists,
        Self::All,
        Self::NotAny,
        Self::Size,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Exists => "$exists",
            Self::All => "$all",
            Self::NotAny => "$notany",
            Self::Size => "$size",
        }
    }

    /// The operator representing logical negation of a single comparison.
    ///
    /// Total involution: applying it twice yields the original operator.
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Exists => Self::Exists,
            Self::All => Self::NotAny,
            Self::NotAny => Self::All,
            Self::Size => Self::Size,
        }
    }

    /// Whether the token resolves from user input.
    #[must_use]
    pub const fn is_wire_resolvable(self) -> bool {
        !matches!(self, Self::Ne | Self::NotAny)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

///
/// REGISTRY
///
/// Process-wide token lookup, built once on first touch and read-only
/// afterwards. Internal-only variants are inserted and then removed so the
/// construction stays a single pass over `FilterOperator::ALL`.
///

static REGISTRY: LazyLock<HashMap<&'static str, FilterOperator>> = LazyLock::new(|| {
    let mut map = HashMap::with_capacity(FilterOperator::ALL.len());

    for op in FilterOperator::ALL {
        map.insert(op.token(), op);
    }
    map.retain(|_, op| op.is_wire_resolvable());

    map
});

/// Resolve a wire token to its operator.
///
/// Unknown tokens (including the internal-only `$ne` / `$notany`) fail with
/// [`FilterError::UnsupportedFilterOperator`]; there is no silent default.
pub fn resolve_operator(token: &str) -> Result<FilterOperator, FilterError> {
    REGISTRY
        .get(token)
        .copied()
        .ok_or_else(|| FilterError::UnsupportedFilterOperator {
            token: token.to_string(),
        })
}

///
/// TESTS
///
