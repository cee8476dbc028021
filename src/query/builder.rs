use crate::error::{GatewayError, GatewayResult};
use crate::query::comparator::Comparator;
use std::fmt;

/// Comparator token that disables the WHERE clause entirely.
pub const FETCH_ALL: &str = "nil";

/// Value compared against the filtered field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Integer(i64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(v.into())
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl fmt::Display for SqlValue {
    /// Literal SQL form: integers bare, text single-quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Integer(i) => write!(f, "{i}"),
            SqlValue::Text(s) => write!(f, "'{}'", escape_literal(s)),
        }
    }
}

/// Escape a string for use inside a single-quoted SQLite literal.
pub fn escape_literal(raw: &str) -> String {
    raw.replace('\'', "''")
}

/// A statement ready for the executor: SQL with `?` placeholders plus the
/// values bound to them, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// One single-table SELECT with at most one comparison.
///
/// Defaults fetch every row of `table`: comparator `nil`, projection `*`,
/// no limit, no offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub table: String,
    pub field: String,
    pub value: SqlValue,
    pub comparator: String,
    pub fields: String,
    pub limit: u64,
    pub offset: u64,
}

impl QuerySpec {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: FETCH_ALL.to_string(),
            value: SqlValue::Text(FETCH_ALL.to_string()),
            comparator: FETCH_ALL.to_string(),
            fields: "*".to_string(),
            limit: 0,
            offset: 0,
        }
    }

    pub fn filter(
        mut self,
        field: impl Into<String>,
        comparator: impl Into<String>,
        value: impl Into<SqlValue>,
    ) -> Self {
        self.field = field.into();
        self.comparator = comparator.into();
        self.value = value.into();
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn is_fetch_all(&self) -> bool {
        self.comparator == FETCH_ALL
    }

    pub fn operator(&self) -> Comparator {
        Comparator::resolve(&self.comparator)
    }

    /// Literal statement text, with the value inlined.
    pub fn render(&self) -> String {
        self.assemble(&self.value.to_string())
    }

    /// Placeholder statement with the value bound separately.
    ///
    /// Identifiers cannot be bound, so table, field and projection must be
    /// plain identifiers.
    pub fn prepare(&self) -> GatewayResult<Statement> {
        ensure_identifier(&self.table)?;
        ensure_projection(&self.fields)?;
        let params = if self.is_fetch_all() {
            Vec::new()
        } else {
            ensure_identifier(&self.field)?;
            vec![self.value.clone()]
        };
        Ok(Statement {
            sql: self.assemble("?"),
            params,
        })
    }

    fn assemble(&self, value: &str) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.fields, self.table);
        if !self.is_fetch_all() {
            sql.push_str(&format!(" WHERE {} {} {}", self.field, self.operator(), value));
            if self.limit > 0 {
                sql.push_str(&format!(" LIMIT {}", self.limit));
            }
            if self.offset > 0 {
                sql.push_str(&format!(" OFFSET {}", self.offset));
            }
        }
        sql.push(';');
        sql
    }
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn ensure_identifier(name: &str) -> GatewayResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(GatewayError::query(format!("Invalid identifier: {name}")))
    }
}

fn ensure_projection(fields: &str) -> GatewayResult<()> {
    if fields == "*" {
        return Ok(());
    }
    fields
        .split(',')
        .map(str::trim)
        .try_for_each(ensure_identifier)
}
