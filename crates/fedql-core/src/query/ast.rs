/// Query and predicate types produced by the parser
///
/// A `Query` names exactly one source and one table; its filters are a forest of
/// `Predicate` trees combined with an implicit AND.
use super::predicate::like_to_pattern;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A translated SELECT statement
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    /// Name the source adapter is registered under
    pub source_name: String,
    pub table: String,
    /// Requested columns in order; empty means all columns
    pub columns: Vec<String>,
    /// Maximum number of rows; 0 means unlimited
    pub limit: usize,
    /// Implicitly AND-ed predicates
    pub filters: Vec<Predicate>,
}

impl Query {
    /// Create a query selecting every column of `source.table`
    pub fn new(source_name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            table: table.into(),
            ..Default::default()
        }
    }

    /// Set the requested columns
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the row limit (0 = unlimited)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Append a filter
    pub fn with_filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    Ne,
    /// Anchored, case-insensitive regular expression match
    Match,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

/// Boolean expression evaluated against a single row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// `field <op> value`
    Comparison {
        op: ComparisonOp,
        field: String,
        value: String,
    },
    /// AND / OR over child predicates, in source order
    Logical {
        op: LogicalOp,
        children: Vec<Predicate>,
    },
}

impl Predicate {
    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::comparison(ComparisonOp::Eq, field, value)
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::comparison(ComparisonOp::Ne, field, value)
    }

    /// Match `field` against an already anchored regular expression
    pub fn matches(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::comparison(ComparisonOp::Match, field, pattern)
    }

    /// `field LIKE pattern`, with `%` wildcards
    pub fn like(field: impl Into<String>, pattern: &str) -> Self {
        Self::matches(field, like_to_pattern(pattern))
    }

    pub fn and(children: Vec<Predicate>) -> Self {
        Predicate::Logical {
            op: LogicalOp::And,
            children,
        }
    }

    pub fn or(children: Vec<Predicate>) -> Self {
        Predicate::Logical {
            op: LogicalOp::Or,
            children,
        }
    }

    fn comparison(op: ComparisonOp, field: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Comparison {
            op,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Every field name referenced anywhere in this tree, in first-seen order
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Comparison { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field);
                }
            }
            Predicate::Logical { children, .. } => {
                for child in children {
                    child.collect_fields(out);
                }
            }
        }
    }
}

// Display implementations for logging and error messages

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.columns.is_empty() {
            write!(f, "*")?;
        } else {
            write!(f, "{}", self.columns.join(", "))?;
        }
        write!(f, " FROM {}.{}", self.source_name, self.table)?;
        for (i, filter) in self.filters.iter().enumerate() {
            if i == 0 {
                write!(f, " WHERE {}", filter)?;
            } else {
                write!(f, " AND {}", filter)?;
            }
        }
        if self.limit > 0 {
            write!(f, " LIMIT {}", self.limit)?;
        }
        Ok(())
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOp::Eq => write!(f, "="),
            ComparisonOp::Ne => write!(f, "!="),
            ComparisonOp::Match => write!(f, "MATCHES"),
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "AND"),
            LogicalOp::Or => write!(f, "OR"),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Comparison { op, field, value } => {
                write!(f, "{} {} '{}'", field, op, value.replace('\'', "''"))
            }
            Predicate::Logical { op, children } => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = Query::new("devops", "builds")
            .with_columns(["name", "url"])
            .with_limit(5)
            .with_filter(Predicate::eq("name", "foo"));

        assert_eq!(query.columns, vec!["name", "url"]);
        assert_eq!(query.limit, 5);
        assert_eq!(query.filters.len(), 1);
    }

    #[test]
    fn test_display() {
        let query = Query::new("devops", "builds").with_filter(Predicate::or(vec![
            Predicate::and(vec![Predicate::eq("a", "1"), Predicate::ne("b", "2")]),
            Predicate::like("c", "x%"),
        ]));

        assert_eq!(
            query.to_string(),
            "SELECT * FROM devops.builds WHERE ((a = '1' AND b != '2') OR c MATCHES '^x.*$')"
        );
    }

    #[test]
    fn test_fields_are_deduplicated_in_order() {
        let predicate = Predicate::and(vec![
            Predicate::eq("b", "1"),
            Predicate::or(vec![Predicate::eq("a", "1"), Predicate::ne("b", "2")]),
        ]);

        assert_eq!(predicate.fields(), vec!["b", "a"]);
    }

    #[test]
    fn test_predicate_wire_format() {
        let predicate = Predicate::or(vec![
            Predicate::eq("project", "web"),
            Predicate::and(vec![
                Predicate::ne("name", "ci"),
                Predicate::matches("folder", "^.*release$"),
            ]),
        ]);

        let value = serde_json::to_value(&predicate).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "kind": "logical",
                "op": "or",
                "children": [
                    {"kind": "comparison", "op": "eq", "field": "project", "value": "web"},
                    {
                        "kind": "logical",
                        "op": "and",
                        "children": [
                            {"kind": "comparison", "op": "ne", "field": "name", "value": "ci"},
                            {"kind": "comparison", "op": "match", "field": "folder", "value": "^.*release$"}
                        ]
                    }
                ]
            })
        );

        let decoded: Predicate = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, predicate);
    }

    #[test]
    fn test_query_round_trips_through_json() {
        let query = Query::new("devops", "pipelines")
            .with_columns(["id"])
            .with_limit(3)
            .with_filter(Predicate::like("name", "deploy%"));

        let text = serde_json::to_string(&query).unwrap();
        assert_eq!(serde_json::from_str::<Query>(&text).unwrap(), query);
    }
}
