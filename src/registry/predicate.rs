//! Storage-level boolean predicates with bound parameters.
//!
//! Predicates are written with `%s` placeholders (and `%%` for a literal
//! percent sign), the way the protocol engine hands them over. Each store
//! renders them into its own placeholder syntax, numbering parameters in
//! clause order.

use crate::registry::store::{StoreError, StoreResult};
use crate::registry::types::Value;

/// Placeholder syntax of a storage engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1`, `$2`, ... (PostgreSQL)
    Dollar,
    /// `?1`, `?2`, ... (SQLite)
    Question,
}

impl PlaceholderStyle {
    fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Dollar => format!("${index}"),
            Self::Question => format!("?{index}"),
        }
    }
}

/// Conjunction of SQL clauses plus their ordered parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Predicate {
    /// A predicate matching every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            clauses: vec![sql.into()],
            params,
        }
    }

    /// `column = %s`
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::new(format!("{column} = %s"), vec![value.into()])
    }

    /// `column IN (%s, ...)`; an empty set matches nothing.
    pub fn any_of(column: &str, values: Vec<Value>) -> Self {
        if values.is_empty() {
            return Self::new("1 = 0", Vec::new());
        }
        let slots = vec!["%s"; values.len()].join(", ");
        Self::new(format!("{column} IN ({slots})"), values)
    }

    pub fn and(mut self, other: Predicate) -> Self {
        self.clauses.extend(other.clauses);
        self.params.extend(other.params);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Render as ` WHERE (...) AND (...)`, or an empty string when unconstrained.
    pub fn where_clause(&self, style: PlaceholderStyle) -> StoreResult<String> {
        if self.clauses.is_empty() {
            return Ok(String::new());
        }

        let mut next = 0usize;
        let rendered: Vec<String> = self
            .clauses
            .iter()
            .map(|clause| format!("({})", render_clause(clause, style, &mut next)))
            .collect();

        if next != self.params.len() {
            return Err(StoreError::InvalidInput(format!(
                "predicate has {next} placeholders but {} bound values",
                self.params.len()
            )));
        }

        Ok(format!(" WHERE {}", rendered.join(" AND ")))
    }
}

fn render_clause(sql: &str, style: PlaceholderStyle, next: &mut usize) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some('s') => {
                    chars.next();
                    *next += 1;
                    out.push_str(&style.placeholder(*next));
                    continue;
                }
                Some('%') => {
                    chars.next();
                    out.push('%');
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// Quote an identifier for interpolation into SQL.
///
/// Column names from sort and domain requests cannot be bound as
/// parameters, so they are always quoted.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_predicate_has_no_where_clause() {
        let sql = Predicate::all().where_clause(PlaceholderStyle::Dollar).unwrap();
        assert_eq!(sql, "");
    }

    #[test]
    fn placeholders_are_numbered_across_clauses() {
        let pred = Predicate::new("catalog_id = 1", vec![])
            .and(Predicate::new("title = %s OR name = %s", vec!["a".into(), "b".into()]))
            .and(Predicate::eq("is_monitored", false));

        assert_eq!(
            pred.where_clause(PlaceholderStyle::Dollar).unwrap(),
            " WHERE (catalog_id = 1) AND (title = $1 OR name = $2) AND (is_monitored = $3)"
        );
        assert_eq!(
            pred.where_clause(PlaceholderStyle::Question).unwrap(),
            " WHERE (catalog_id = 1) AND (title = ?1 OR name = ?2) AND (is_monitored = ?3)"
        );
    }

    #[test]
    fn doubled_percent_is_a_literal() {
        let pred = Predicate::new("title LIKE 'a%%' AND id = %s", vec![Value::Int(1)]);
        assert_eq!(
            pred.where_clause(PlaceholderStyle::Question).unwrap(),
            " WHERE (title LIKE 'a%' AND id = ?1)"
        );
    }

    #[test]
    fn placeholder_count_mismatch_is_rejected() {
        let pred = Predicate::new("id = %s", vec![]);
        assert!(matches!(
            pred.where_clause(PlaceholderStyle::Dollar),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let pred = Predicate::any_of("uuid", vec![]);
        assert_eq!(
            pred.where_clause(PlaceholderStyle::Dollar).unwrap(),
            " WHERE (1 = 0)"
        );
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("title"), "\"title\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
