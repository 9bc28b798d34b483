//! Allow-list validation gate for candidate queries.
//!
//! A surface syntactic scan over generated SQL text: every identifier
//! following a `FROM` token and every item in the `SELECT … FROM` projection
//! list must appear in the fixed allow-list. This is not a parser and not a
//! general SQL-injection defense; it assumes a single-table, non-nested query
//! shape and only catches accidental references to unknown schema elements.
//! Statement chaining, comment smuggling and sub-queries against other tables
//! are out of scope and documented as a known limitation.
//!
//! Passing the gate is a precondition for execution: a rejection carries the
//! offending identifier and the query must never reach the store.

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error;

/// Rejection reasons, each naming the first offending identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("query references unknown table: {0}")]
    UnknownTable(String),

    #[error("query references unknown column: {0}")]
    UnknownColumn(String),
}

/// Fixed sets of permitted table and column names, static for the lifetime
/// of the process. Lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct AllowList {
    tables: HashSet<String>,
    columns: HashSet<String>,
}

impl AllowList {
    pub fn new<T, C>(tables: T, columns: C) -> Self
    where
        T: IntoIterator<Item = String>,
        C: IntoIterator<Item = String>,
    {
        Self {
            tables: tables.into_iter().map(|t| t.to_lowercase()).collect(),
            columns: columns.into_iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    /// The allow-list for the one managed table.
    pub fn seed_packs() -> Self {
        Self::new(
            ["seed_packs".to_string()],
            [
                "id".to_string(),
                "seed_name".to_string(),
                "variety".to_string(),
                "quantity".to_string(),
                "plant_type".to_string(),
                "seed_source".to_string(),
                "date_acquired".to_string(),
            ],
        )
    }

    pub fn allows_table(&self, name: &str) -> bool {
        self.tables.contains(&name.to_lowercase())
    }

    pub fn allows_column(&self, name: &str) -> bool {
        self.columns.contains(&name.to_lowercase())
    }
}

/// Validate a candidate query against the allow-list.
///
/// Rejects at the first table after a `FROM` token or the first projection
/// column not present in the corresponding set. A bare `*` is always valid,
/// a single trailing alias is stripped, and one level of function call
/// (`COUNT(*)`, `count(seed_name)`) is unwrapped and checked by its inner
/// argument. Idempotent: the same query always yields the same verdict.
pub fn validate(query: &str, allow: &AllowList) -> Result<(), GateError> {
    let from_re = Regex::new(r"(?i)\bfrom\s+([A-Za-z0-9_]+)").expect("valid regex");
    for cap in from_re.captures_iter(query) {
        let table = &cap[1];
        if !allow.allows_table(table) {
            return Err(GateError::UnknownTable(table.to_string()));
        }
    }

    let projection_re = Regex::new(r"(?is)\bselect\s+(.*?)\s+from\b").expect("valid regex");
    for cap in projection_re.captures_iter(query) {
        let projection = cap[1].trim();
        // A leading DISTINCT qualifies the whole list, not a column.
        let projection = strip_leading_keyword(projection, "distinct");
        for item in projection.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            // Strip a single trailing alias: keep the head token only.
            let head = item.split_whitespace().next().unwrap_or(item);
            if let Some(column) = projected_column(head) {
                if !allow.allows_column(&column) {
                    return Err(GateError::UnknownColumn(column));
                }
            }
        }
    }

    Ok(())
}

/// The column name a projection head refers to, or `None` when the item is
/// valid regardless of the allow-list (bare `*`, function over `*`).
fn projected_column(head: &str) -> Option<String> {
    let head = head.trim_end_matches(';').trim();
    if head == "*" {
        return None;
    }
    if let (Some(open), true) = (head.find('('), head.ends_with(')')) {
        let inner = head[open + 1..head.len() - 1].trim();
        let inner = strip_leading_keyword(inner, "distinct");
        if inner.is_empty() || inner == "*" {
            return None;
        }
        return Some(inner.to_string());
    }
    Some(head.to_string())
}

fn strip_leading_keyword<'a>(text: &'a str, keyword: &str) -> &'a str {
    let lowered = text.to_lowercase();
    if let Some(rest) = lowered.strip_prefix(keyword) {
        if rest.starts_with(char::is_whitespace) {
            return text[keyword.len()..].trim_start();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_count_over_star_is_accepted() {
        let allow = AllowList::seed_packs();
        assert_eq!(
            validate("SELECT COUNT(*) as total_seed_packs FROM seed_packs;", &allow),
            Ok(()),
        );
    }

    #[test]
    fn bare_star_is_always_valid() {
        let allow = AllowList::seed_packs();
        assert_eq!(
            validate("SELECT * FROM seed_packs WHERE plant_type = 'Herb';", &allow),
            Ok(()),
        );
    }

    #[test]
    fn unknown_table_is_rejected_by_name() {
        let allow = AllowList::seed_packs();
        assert_eq!(
            validate("SELECT * FROM secret_table;", &allow),
            Err(GateError::UnknownTable("secret_table".to_string())),
        );
    }

    #[test]
    fn unknown_table_is_rejected_regardless_of_projection() {
        let allow = AllowList::seed_packs();
        assert_eq!(
            validate("SELECT seed_name FROM garden_tools;", &allow),
            Err(GateError::UnknownTable("garden_tools".to_string())),
        );
    }

    #[test]
    fn unknown_column_is_rejected_by_name() {
        let allow = AllowList::seed_packs();
        assert_eq!(
            validate("SELECT secret_column FROM seed_packs;", &allow),
            Err(GateError::UnknownColumn("secret_column".to_string())),
        );
    }

    #[test]
    fn trailing_alias_is_stripped_before_lookup() {
        let allow = AllowList::seed_packs();
        assert_eq!(
            validate("SELECT seed_name name, plant_type FROM seed_packs;", &allow),
            Ok(()),
        );
    }

    #[test]
    fn grouped_projection_with_aggregate_passes() {
        let allow = AllowList::seed_packs();
        assert_eq!(
            validate(
                "SELECT seed_source, COUNT(*) as packs FROM seed_packs GROUP BY seed_source;",
                &allow,
            ),
            Ok(()),
        );
    }

    #[test]
    fn aggregate_over_unknown_column_is_rejected() {
        let allow = AllowList::seed_packs();
        assert_eq!(
            validate("SELECT SUM(price) FROM seed_packs;", &allow),
            Err(GateError::UnknownColumn("price".to_string())),
        );
    }

    #[test]
    fn distinct_keyword_is_not_treated_as_a_column() {
        let allow = AllowList::seed_packs();
        assert_eq!(
            validate("SELECT DISTINCT seed_name FROM seed_packs;", &allow),
            Ok(()),
        );
    }

    #[test]
    fn identifier_lookup_is_case_insensitive() {
        let allow = AllowList::seed_packs();
        assert_eq!(validate("select Seed_Name from SEED_PACKS", &allow), Ok(()));
    }

    #[test]
    fn validation_is_idempotent() {
        let allow = AllowList::seed_packs();
        let query = "SELECT secret_column FROM seed_packs;";
        assert_eq!(validate(query, &allow), validate(query, &allow));
    }
}
