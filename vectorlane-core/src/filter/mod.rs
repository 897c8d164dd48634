//! Boolean filter expressions over scalar fields.
//!
//! Search requests carry filters as text, e.g.
//! `subject == "history" and year >= 1950`. The server side parses them with
//! [`Filter::parse`] and evaluates them per record. Filters can also be built
//! programmatically and rendered back to text with `Display`.
//!
//! Rendering is lossless for scalar literals (numbers, strings, booleans and
//! `null`): the text parses back to the same condition. Array or object
//! values have no literal form and are written as JSON, which does not parse.

mod parser;

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::record::Record;

/// A filter expression that can be evaluated against a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub(crate) condition: FilterCondition,
}

impl Filter {
    /// Parses a filter expression.
    ///
    /// # Example
    ///
    /// ```
    /// use vectorlane_core::{Filter, Record};
    ///
    /// let filter = Filter::parse(r#"subject == "history" and id in [0, 1, 2]"#).unwrap();
    /// let record = Record::new().with_field("subject", "history").with_field("id", 1);
    /// assert!(filter.matches(&record));
    ///
    /// assert!(Filter::parse("subject ==").is_err());
    /// ```
    pub fn parse(expr: &str) -> Result<Self> {
        parser::parse(expr).map(Self::from_condition)
    }

    /// Creates a filter for a specific field.
    ///
    /// ```
    /// use vectorlane_core::Filter;
    ///
    /// let filter = Filter::field("subject").eq("history");
    /// assert_eq!(filter.to_string(), r#"subject == "history""#);
    /// ```
    pub fn field(name: &str) -> FieldFilter {
        FieldFilter {
            field_name: name.to_string(),
        }
    }

    /// Creates a filter from a condition.
    pub fn from_condition(condition: FilterCondition) -> Self {
        Self { condition }
    }

    /// Combines this filter with another using AND.
    pub fn and(self, other: Filter) -> Self {
        Self {
            condition: FilterCondition::And(Box::new(self.condition), Box::new(other.condition)),
        }
    }

    /// Combines this filter with another using OR.
    pub fn or(self, other: Filter) -> Self {
        Self {
            condition: FilterCondition::Or(Box::new(self.condition), Box::new(other.condition)),
        }
    }

    /// Negates this filter.
    #[allow(clippy::should_implement_trait)]
    pub fn negate(self) -> Self {
        Self {
            condition: FilterCondition::Not(Box::new(self.condition)),
        }
    }

    #[inline]
    pub fn condition(&self) -> &FilterCondition {
        &self.condition
    }

    /// Field names referenced by the expression, in order of appearance.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.condition.collect_fields(&mut out);
        out
    }

    /// Evaluates the filter against a record. Returns true if the record matches.
    pub fn matches(&self, record: &Record) -> bool {
        self.condition.matches(record)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.condition.write_expr(f)
    }
}

/// Builder for field-specific filter conditions.
#[derive(Debug)]
pub struct FieldFilter {
    field_name: String,
}

impl FieldFilter {
    /// Field equals value.
    pub fn eq<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Eq(self.field_name, value.into()))
    }

    /// Field not equals value.
    pub fn ne<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Ne(self.field_name, value.into()))
    }

    /// Field greater than value.
    pub fn gt<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Gt(self.field_name, value.into()))
    }

    /// Field greater than or equal to value.
    pub fn gte<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Gte(self.field_name, value.into()))
    }

    /// Field less than value.
    pub fn lt<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Lt(self.field_name, value.into()))
    }

    /// Field less than or equal to value.
    pub fn lte<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Lte(self.field_name, value.into()))
    }

    /// Field value is in the given list.
    pub fn contained_in<V: Into<Value>>(self, values: Vec<V>) -> Filter {
        let values: Vec<Value> = values.into_iter().map(|v| v.into()).collect();
        Filter::from_condition(FilterCondition::In(self.field_name, values))
    }

    /// String field matches a `like` pattern (`%` wildcard at either end).
    pub fn like(self, pattern: &str) -> Filter {
        Filter::from_condition(FilterCondition::Like(self.field_name, pattern.to_string()))
    }

    /// String field contains the given substring.
    pub fn contains(self, substring: &str) -> Filter {
        self.like(&format!("%{}%", substring))
    }
}

/// The actual filter condition variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
    /// Field equals value
    Eq(String, Value),
    /// Field not equals value
    Ne(String, Value),
    /// Field greater than value
    Gt(String, Value),
    /// Field greater than or equal to value
    Gte(String, Value),
    /// Field less than value
    Lt(String, Value),
    /// Field less than or equal to value
    Lte(String, Value),
    /// Field value is in list
    In(String, Vec<Value>),
    /// String field matches pattern
    Like(String, String),
    /// Logical AND
    And(Box<FilterCondition>, Box<FilterCondition>),
    /// Logical OR
    Or(Box<FilterCondition>, Box<FilterCondition>),
    /// Logical NOT
    Not(Box<FilterCondition>),
}

impl FilterCondition {
    /// Evaluates this condition against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            FilterCondition::Eq(field, value) => record
                .get(field)
                .map(|v| values_equal(v, value))
                .unwrap_or(false),
            FilterCondition::Ne(field, value) => record
                .get(field)
                .map(|v| !values_equal(v, value))
                .unwrap_or(true),
            FilterCondition::Gt(field, value) => {
                compare_values(record.get(field), value, |a, b| a > b)
            }
            FilterCondition::Gte(field, value) => {
                compare_values(record.get(field), value, |a, b| a >= b)
            }
            FilterCondition::Lt(field, value) => {
                compare_values(record.get(field), value, |a, b| a < b)
            }
            FilterCondition::Lte(field, value) => {
                compare_values(record.get(field), value, |a, b| a <= b)
            }
            FilterCondition::In(field, values) => record
                .get(field)
                .map(|v| values.iter().any(|candidate| values_equal(v, candidate)))
                .unwrap_or(false),
            FilterCondition::Like(field, pattern) => record
                .get_str(field)
                .map(|s| like_matches(s, pattern))
                .unwrap_or(false),
            FilterCondition::And(a, b) => a.matches(record) && b.matches(record),
            FilterCondition::Or(a, b) => a.matches(record) || b.matches(record),
            FilterCondition::Not(c) => !c.matches(record),
        }
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterCondition::Eq(f, _)
            | FilterCondition::Ne(f, _)
            | FilterCondition::Gt(f, _)
            | FilterCondition::Gte(f, _)
            | FilterCondition::Lt(f, _)
            | FilterCondition::Lte(f, _)
            | FilterCondition::In(f, _)
            | FilterCondition::Like(f, _) => out.push(f),
            FilterCondition::And(a, b) | FilterCondition::Or(a, b) => {
                a.collect_fields(out);
                b.collect_fields(out);
            }
            FilterCondition::Not(c) => c.collect_fields(out),
        }
    }

    fn write_expr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterCondition::Eq(field, v) => write_comparison(f, field, "==", v),
            FilterCondition::Ne(field, v) => write_comparison(f, field, "!=", v),
            FilterCondition::Gt(field, v) => write_comparison(f, field, ">", v),
            FilterCondition::Gte(field, v) => write_comparison(f, field, ">=", v),
            FilterCondition::Lt(field, v) => write_comparison(f, field, "<", v),
            FilterCondition::Lte(field, v) => write_comparison(f, field, "<=", v),
            FilterCondition::In(field, values) => {
                write!(f, "{} in [", field)?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_literal(f, v)?;
                }
                f.write_str("]")
            }
            FilterCondition::Like(field, pattern) => {
                write!(f, "{} like ", field)?;
                write_quoted(f, pattern)
            }
            FilterCondition::And(a, b) => {
                f.write_str("(")?;
                a.write_expr(f)?;
                f.write_str(" and ")?;
                b.write_expr(f)?;
                f.write_str(")")
            }
            FilterCondition::Or(a, b) => {
                f.write_str("(")?;
                a.write_expr(f)?;
                f.write_str(" or ")?;
                b.write_expr(f)?;
                f.write_str(")")
            }
            FilterCondition::Not(c) => {
                f.write_str("not (")?;
                c.write_expr(f)?;
                f.write_str(")")
            }
        }
    }
}

fn write_comparison(f: &mut fmt::Formatter<'_>, field: &str, op: &str, v: &Value) -> fmt::Result {
    write!(f, "{} {} ", field, op)?;
    write_literal(f, v)
}

fn write_literal(f: &mut fmt::Formatter<'_>, v: &Value) -> fmt::Result {
    match v {
        Value::String(s) => write_quoted(f, s),
        other => write!(f, "{}", other),
    }
}

/// Double-quoted, escaping only what the parser unescapes.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

/// Equality that treats `1` and `1.0` as the same number.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(xv), Some(yv)) => xv == yv,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Helper to compare numeric or string values.
fn compare_values<F>(field_value: Option<&Value>, target: &Value, cmp: F) -> bool
where
    F: Fn(std::cmp::Ordering, std::cmp::Ordering) -> bool,
{
    let ordering = match (field_value, target) {
        (Some(Value::Number(a)), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(av), Some(bv)) => av.partial_cmp(&bv),
            _ => None,
        },
        (Some(Value::String(a)), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    };
    ordering
        .map(|o| cmp(o, std::cmp::Ordering::Equal))
        .unwrap_or(false)
}

/// `%` at the start and/or end of the pattern is a wildcard.
fn like_matches(s: &str, pattern: &str) -> bool {
    let (leading, rest) = match pattern.strip_prefix('%') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let (trailing, core) = match rest.strip_suffix('%') {
        Some(core) => (true, core),
        None => (false, rest),
    };

    match (leading, trailing) {
        (true, true) => s.contains(core),
        (true, false) => s.ends_with(core),
        (false, true) => s.starts_with(core),
        (false, false) => s == core,
    }
}
