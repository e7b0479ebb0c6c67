use crate::{core::value::Value, records::record::Record};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilterOperation {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<>")]
    NotEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "like")]
    Like,
}

impl FilterOperation {
    pub fn as_sql(&self) -> &'static str {
        match self {
            FilterOperation::Equal => "=",
            FilterOperation::NotEqual => "<>",
            FilterOperation::Greater => ">",
            FilterOperation::Less => "<",
            FilterOperation::GreaterOrEqual => ">=",
            FilterOperation::LessOrEqual => "<=",
            FilterOperation::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

/// A row predicate on a single source column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Filter {
    pub name: String,
    pub operation: FilterOperation,
    pub value: String,
    #[serde(default)]
    pub logic: FilterLogic,
}

impl Filter {
    pub fn new(
        name: impl Into<String>,
        operation: FilterOperation,
        value: impl Into<String>,
        logic: FilterLogic,
    ) -> Self {
        Self {
            name: name.into(),
            operation,
            value: value.into(),
            logic,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let Some(actual) = record.get(&self.name) else {
            return false;
        };
        let expected = Value::String(self.value.clone());

        let ord = actual.compare(&expected);

        match self.operation {
            FilterOperation::Like => actual
                .as_string()
                .is_some_and(|s| like_match(&s, &self.value)),
            FilterOperation::Equal => ord == Some(Ordering::Equal),
            FilterOperation::NotEqual => ord != Some(Ordering::Equal),
            FilterOperation::Greater => ord == Some(Ordering::Greater),
            FilterOperation::Less => ord == Some(Ordering::Less),
            FilterOperation::GreaterOrEqual => {
                matches!(ord, Some(Ordering::Greater | Ordering::Equal))
            }
            FilterOperation::LessOrEqual => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        }
    }

    /// Every `and` filter must hold; when `or` filters exist at least one of
    /// them must hold too.
    pub fn evaluate(filters: &[Filter], record: &Record) -> bool {
        let mut any_or = false;
        let mut or_hit = false;

        for filter in filters {
            match filter.logic {
                FilterLogic::And => {
                    if !filter.matches(record) {
                        return false;
                    }
                }
                FilterLogic::Or => {
                    any_or = true;
                    or_hit = or_hit || filter.matches(record);
                }
            }
        }

        !any_or || or_hit
    }
}

/// SQL `LIKE` with `%` and `_` wildcards.
fn like_match(text: &str, pattern: &str) -> bool {
    let t: Vec<char> = text.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    let (mut ti, mut pi) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == t[ti]) {
            ti += 1;
            pi += 1;
        } else if pi < p.len() && p[pi] == '%' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Record {
        Record::new()
            .with("age", 30)
            .with("name", "alice")
            .with("city", "Oslo")
    }

    #[test]
    fn numeric_comparison_uses_value_ordering() {
        let f = Filter::new("age", FilterOperation::GreaterOrEqual, "30", FilterLogic::And);
        assert!(f.matches(&row()));
        let f = Filter::new("age", FilterOperation::Greater, "100", FilterLogic::And);
        assert!(!f.matches(&row()));
    }

    #[test]
    fn like_supports_wildcards() {
        assert!(like_match("alice", "a%"));
        assert!(like_match("alice", "_lic_"));
        assert!(like_match("alice", "%"));
        assert!(!like_match("alice", "b%"));
        assert!(!like_match("alice", "alic"));
    }

    #[test]
    fn or_group_requires_one_hit() {
        let filters = vec![
            Filter::new("age", FilterOperation::Equal, "30", FilterLogic::And),
            Filter::new("city", FilterOperation::Equal, "Bergen", FilterLogic::Or),
            Filter::new("name", FilterOperation::Like, "al%", FilterLogic::Or),
        ];
        assert!(Filter::evaluate(&filters, &row()));

        let filters = vec![Filter::new("city", FilterOperation::Equal, "Bergen", FilterLogic::Or)];
        assert!(!Filter::evaluate(&filters, &row()));
        assert!(Filter::evaluate(&[], &row()));
    }

    #[test]
    fn missing_column_never_matches() {
        let f = Filter::new("ghost", FilterOperation::NotEqual, "x", FilterLogic::And);
        assert!(!f.matches(&row()));
    }

    #[test]
    fn operation_deserializes_from_symbol() {
        let f: Filter =
            serde_json::from_str(r#"{"name":"a","operation":"<>","value":"1"}"#).unwrap();
        assert_eq!(f.operation, FilterOperation::NotEqual);
        assert_eq!(f.logic, FilterLogic::And);
    }
}
