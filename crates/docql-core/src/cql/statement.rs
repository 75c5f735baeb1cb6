use crate::cql::{BindValues, StatementError, WhereTerm, clause_idempotent, render_where};
use tracing::debug;

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    #[must_use]
    pub const fn as_cql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

///
/// Ordering
///
/// The ORDER BY slot of a statement. Lexical ranking is its own clause kind
/// rendered directly from here; there is no placeholder substitution, so a
/// malformed ranking clause cannot exist post-render.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Ordering {
    Unordered,
    Columns(Vec<(String, OrderDirection)>),
    /// `ORDER BY <column> BM25 OF '<text>'`. The query text is escaped via
    /// CQL string quoting; this clause position does not support binding.
    LexicalRank { column: String, query: String },
}

///
/// SelectStatement
///
/// A full SELECT in AST form: selectors, source table, where-terms, and the
/// trailing clauses of the normal single-statement grammar. WHERE emission
/// is synthesized at the text level (the native grammar only offers an
/// implicit conjunction); everything else mirrors CQL directly.
///
/// Once the ordering is [`Ordering::LexicalRank`], the statement is locked:
/// only `limit` and `allow_filtering` remain legal, every other structural
/// mutator fails fast with [`StatementError::LexicalStatementLocked`].
///

#[derive(Clone, Debug, PartialEq)]
pub struct SelectStatement {
    keyspace: String,
    table: String,
    selectors: Vec<String>,
    terms: Vec<WhereTerm>,
    group_by: Vec<String>,
    ordering: Ordering,
    per_partition_limit: Option<u32>,
    limit: Option<u32>,
    allow_filtering: bool,
    distinct: bool,
    json: bool,
}

///
/// RenderedStatement
///
/// Query text plus the bind values in textual order, ready for the
/// execution layer. A lexically ranked statement carries no bind position
/// for its ranking clause.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedStatement {
    pub cql: String,
    pub binds: BindValues,
    pub idempotent: bool,
}

impl SelectStatement {
    /// `SELECT * FROM <keyspace>.<table>` with nothing else set.
    pub fn from_table(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            selectors: Vec::new(),
            terms: Vec::new(),
            group_by: Vec::new(),
            ordering: Ordering::Unordered,
            per_partition_limit: None,
            limit: None,
            allow_filtering: false,
            distinct: false,
            json: false,
        }
    }

    fn ensure_unlocked(&self, mutator: &'static str) -> Result<(), StatementError> {
        if matches!(self.ordering, Ordering::LexicalRank { .. }) {
            return Err(StatementError::LexicalStatementLocked { mutator });
        }
        Ok(())
    }

    /// Replace the selector list. An empty list renders `*`.
    pub fn columns<I, S>(mut self, columns: I) -> Result<Self, StatementError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_unlocked("columns")?;
        self.selectors = columns.into_iter().map(Into::into).collect();
        Ok(self)
    }

    /// Replace the WHERE term list.
    pub fn where_terms(mut self, terms: Vec<WhereTerm>) -> Result<Self, StatementError> {
        self.ensure_unlocked("where_terms")?;
        self.terms = terms;
        Ok(self)
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Result<Self, StatementError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_unlocked("group_by")?;
        self.group_by = columns.into_iter().map(Into::into).collect();
        Ok(self)
    }

    /// Append a generic ordering key.
    pub fn order_by(
        mut self,
        column: impl Into<String>,
        direction: OrderDirection,
    ) -> Result<Self, StatementError> {
        self.ensure_unlocked("order_by")?;
        match &mut self.ordering {
            Ordering::Columns(keys) => keys.push((column.into(), direction)),
            _ => self.ordering = Ordering::Columns(vec![(column.into(), direction)]),
        }
        Ok(self)
    }

    /// Order by lexical relevance of `query` against `column`. Locks the
    /// statement: from here on only `limit` and `allow_filtering` apply.
    pub fn order_by_rank(
        mut self,
        column: impl Into<String>,
        query: impl Into<String>,
    ) -> Result<Self, StatementError> {
        self.ensure_unlocked("order_by_rank")?;
        self.ordering = Ordering::LexicalRank {
            column: column.into(),
            query: query.into(),
        };
        Ok(self)
    }

    pub fn distinct(mut self) -> Result<Self, StatementError> {
        self.ensure_unlocked("distinct")?;
        self.distinct = true;
        Ok(self)
    }

    pub fn json(mut self) -> Result<Self, StatementError> {
        self.ensure_unlocked("json")?;
        self.json = true;
        Ok(self)
    }

    pub fn per_partition_limit(mut self, n: u32) -> Result<Self, StatementError> {
        self.ensure_unlocked("per_partition_limit")?;
        self.per_partition_limit = Some(n);
        Ok(self)
    }

    /// Always legal, including on a lexically ranked statement.
    #[must_use]
    pub const fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Always legal, including on a lexically ranked statement.
    #[must_use]
    pub const fn allow_filtering(mut self) -> Self {
        self.allow_filtering = true;
        self
    }

    #[must_use]
    pub fn terms(&self) -> &[WhereTerm] {
        &self.terms
    }

    /// Render to query text and positional bind values.
    #[must_use]
    pub fn render(&self) -> RenderedStatement {
        let mut cql = String::from("SELECT ");
        let mut binds = BindValues::new();

        if self.json {
            cql.push_str("JSON ");
        }
        if self.distinct {
            cql.push_str("DISTINCT ");
        }
        if self.selectors.is_empty() {
            cql.push('*');
        } else {
            cql.push_str(&self.selectors.join(", "));
        }

        cql.push_str(" FROM ");
        cql.push_str(&self.keyspace);
        cql.push('.');
        cql.push_str(&self.table);

        render_where(&self.terms, false, &mut cql, &mut binds);

        if !self.group_by.is_empty() {
            cql.push_str(" GROUP BY ");
            cql.push_str(&self.group_by.join(", "));
        }

        self.render_ordering(&mut cql);

        if let Some(n) = self.per_partition_limit {
            cql.push_str(" PER PARTITION LIMIT ");
            cql.push_str(&n.to_string());
        }
        if let Some(n) = self.limit {
            cql.push_str(" LIMIT ");
            cql.push_str(&n.to_string());
        }
        if self.allow_filtering {
            cql.push_str(" ALLOW FILTERING");
        }

        debug!(binds = binds.len(), "rendered select statement");

        RenderedStatement {
            idempotent: clause_idempotent(&self.terms),
            cql,
            binds,
        }
    }

    fn render_ordering(&self, cql: &mut String) {
        match &self.ordering {
            Ordering::Unordered => {}
            Ordering::Columns(keys) => {
                cql.push_str(" ORDER BY ");
                for (i, (column, direction)) in keys.iter().enumerate() {
                    if i > 0 {
                        cql.push_str(", ");
                    }
                    cql.push_str(column);
                    cql.push(' ');
                    cql.push_str(direction.as_cql());
                }
            }
            Ordering::LexicalRank { column, query } => {
                cql.push_str(" ORDER BY ");
                cql.push_str(column);
                cql.push_str(" BM25 OF ");
                push_quoted(cql, query);
            }
        }
    }
}

/// CQL string quoting: wrap in single quotes, doubling any quote inside.
fn push_quoted(out: &mut String, text: &str) {
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
}

///
/// TESTS
///
