/// Predicate evaluation
///
/// The same evaluator serves adapters that filter on their side and the engine's
/// fallback pass over rows it has already received. Evaluation never fails: a
/// missing field reads as the empty string, and a pattern that does not compile
/// matches nothing.
use super::ast::{ComparisonOp, LogicalOp, Predicate};
use crate::source::{ResultSet, Row};
use regex::{Regex, RegexBuilder};

/// Rewrite a SQL LIKE pattern into an anchored regular expression.
///
/// Each `%` matches any span; everything else is matched literally and the
/// pattern must cover the whole value.
///
/// ```
/// use fedql_core::query::like_to_pattern;
///
/// assert_eq!(like_to_pattern("foo%"), "^foo.*$");
/// assert_eq!(like_to_pattern("%a.b%"), "^.*a\\.b.*$");
/// ```
pub fn like_to_pattern(like: &str) -> String {
    let body = like
        .split('%')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{}$", body)
}

impl Predicate {
    /// Evaluate this predicate against one row
    pub fn evaluate(&self, row: &Row) -> bool {
        Compiled::new(self).matches(row)
    }

    /// Keep the rows this predicate accepts, preserving order
    pub fn filter(&self, rows: ResultSet) -> ResultSet {
        filter_rows(std::slice::from_ref(self), rows)
    }
}

/// Keep the rows for which every predicate holds, preserving order.
///
/// An empty predicate list keeps every row.
pub fn filter_rows(predicates: &[Predicate], rows: ResultSet) -> ResultSet {
    if predicates.is_empty() {
        return rows;
    }

    let compiled: Vec<Compiled<'_>> = predicates.iter().map(Compiled::new).collect();

    rows.into_iter()
        .filter(|row| compiled.iter().all(|c| c.matches(row)))
        .collect()
}

/// Find the value an `Eq` comparison pins `field` to.
///
/// Looks at top-level filters and through nested AND nodes, where the comparison
/// must hold for every accepted row. Comparisons under an OR are ignored.
pub fn required_equality<'a>(filters: &'a [Predicate], field: &str) -> Option<&'a str> {
    filters.iter().find_map(|p| find_equality(p, field))
}

fn find_equality<'a>(predicate: &'a Predicate, wanted: &str) -> Option<&'a str> {
    match predicate {
        Predicate::Comparison {
            op: ComparisonOp::Eq,
            field,
            value,
        } if field == wanted => Some(value.as_str()),
        Predicate::Comparison { .. } => None,
        Predicate::Logical {
            op: LogicalOp::And,
            children,
        } => children.iter().find_map(|c| find_equality(c, wanted)),
        Predicate::Logical {
            op: LogicalOp::Or, ..
        } => None,
    }
}

/// Predicate tree with patterns compiled and comparison values lower-cased
enum Compiled<'a> {
    Eq { field: &'a str, value: String },
    Ne { field: &'a str, value: String },
    Match { field: &'a str, regex: Option<Regex> },
    And(Vec<Compiled<'a>>),
    Or(Vec<Compiled<'a>>),
}

impl<'a> Compiled<'a> {
    fn new(predicate: &'a Predicate) -> Self {
        match predicate {
            Predicate::Comparison { op, field, value } => match op {
                ComparisonOp::Eq => Compiled::Eq {
                    field,
                    value: value.to_lowercase(),
                },
                ComparisonOp::Ne => Compiled::Ne {
                    field,
                    value: value.to_lowercase(),
                },
                ComparisonOp::Match => Compiled::Match {
                    field,
                    regex: compile_pattern(value),
                },
            },
            Predicate::Logical { op, children } => {
                let children = children.iter().map(Compiled::new).collect();
                match op {
                    LogicalOp::And => Compiled::And(children),
                    LogicalOp::Or => Compiled::Or(children),
                }
            }
        }
    }

    fn matches(&self, row: &Row) -> bool {
        match self {
            Compiled::Eq { field, value } => field_value(row, field).to_lowercase() == *value,
            Compiled::Ne { field, value } => field_value(row, field).to_lowercase() != *value,
            Compiled::Match { field, regex } => regex
                .as_ref()
                .is_some_and(|re| re.is_match(field_value(row, field))),
            Compiled::And(children) => children.iter().all(|c| c.matches(row)),
            Compiled::Or(children) => children.iter().any(|c| c.matches(row)),
        }
    }
}

fn field_value<'r>(row: &'r Row, field: &str) -> &'r str {
    row.get(field).map(String::as_str).unwrap_or("")
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "match pattern does not compile; it will match nothing");
            None
        }
    }
}
