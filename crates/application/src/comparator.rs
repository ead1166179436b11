//! Type-aware ordering of arbitrary JSON values.
//!
//! Black-box responses carry values whose semantic type is only implied:
//! a date may arrive as a string, a number as either a JSON number or its
//! decimal text. The comparator infers one semantic type per comparison
//! and orders both operands under it, degrading to lexical string
//! comparison whenever coercion fails. It never returns an error and
//! never panics; malformed operands simply compare as text.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use veriqry_domain::FieldType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SemanticType {
    Number,
    Temporal,
    Boolean,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemporalValue {
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
}

impl TemporalValue {
    fn timeline(self) -> NaiveDateTime {
        match self {
            Self::DateTime(datetime) => datetime.naive_utc(),
            Self::Date(date) => date.and_time(NaiveTime::MIN),
        }
    }
}

/// Orders two values under their inferred or declared semantic type.
///
/// Nulls order before any non-null value and equal to each other.
/// Inference priority: declared schema type, field-name heuristics, both
/// operands numeric, both temporal (RFC3339 then bare `YYYY-MM-DD`), both
/// boolean literals, lexical string comparison last.
#[must_use]
pub fn compare_values(
    left: &Value,
    right: &Value,
    field: &str,
    declared: Option<FieldType>,
) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }

    match resolve_semantic_type(left, right, field, declared) {
        SemanticType::Number => match (numeric_value(left), numeric_value(right)) {
            (Some(left_number), Some(right_number)) => left_number
                .partial_cmp(&right_number)
                .unwrap_or_else(|| lexical_compare(left, right)),
            _ => lexical_compare(left, right),
        },
        SemanticType::Temporal => match (temporal_value(left), temporal_value(right)) {
            (Some(left_temporal), Some(right_temporal)) => {
                left_temporal.timeline().cmp(&right_temporal.timeline())
            }
            _ => lexical_compare(left, right),
        },
        SemanticType::Boolean => match (boolean_value(left), boolean_value(right)) {
            (Some(left_flag), Some(right_flag)) => left_flag.cmp(&right_flag),
            _ => lexical_compare(left, right),
        },
        SemanticType::Text => lexical_compare(left, right),
    }
}

/// Equality test for filter conditions, with the bare-date special case.
///
/// A bare-date expected value equals a datetime actual value only when the
/// datetime's time-of-day is exactly midnight; any other time-of-day falls
/// back to comparing the full strings, never to a truncated date.
#[must_use]
pub fn values_match_eq(
    actual: &Value,
    expected: &Value,
    field: &str,
    declared: Option<FieldType>,
) -> bool {
    if let (Some(TemporalValue::Date(expected_date)), Some(TemporalValue::DateTime(actual_datetime))) =
        (temporal_value(expected), temporal_value(actual))
    {
        return if actual_datetime.time() == NaiveTime::MIN {
            actual_datetime.date_naive() == expected_date
        } else {
            canonical_text(actual) == canonical_text(expected)
        };
    }

    compare_values(actual, expected, field, declared) == Ordering::Equal
}

fn resolve_semantic_type(
    left: &Value,
    right: &Value,
    field: &str,
    declared: Option<FieldType>,
) -> SemanticType {
    if let Some(declared) = declared
        && let Some(semantic) = declared_semantic(declared)
    {
        return semantic;
    }

    if let Some(semantic) = field_name_semantic(field) {
        return semantic;
    }

    if numeric_value(left).is_some() && numeric_value(right).is_some() {
        return SemanticType::Number;
    }

    if temporal_value(left).is_some() && temporal_value(right).is_some() {
        return SemanticType::Temporal;
    }

    if boolean_value(left).is_some() && boolean_value(right).is_some() {
        return SemanticType::Boolean;
    }

    SemanticType::Text
}

fn declared_semantic(declared: FieldType) -> Option<SemanticType> {
    match declared {
        FieldType::Number => Some(SemanticType::Number),
        FieldType::Date | FieldType::DateTime => Some(SemanticType::Temporal),
        FieldType::Boolean => Some(SemanticType::Boolean),
        FieldType::Text | FieldType::Relation => Some(SemanticType::Text),
        FieldType::Json => None,
    }
}

fn field_name_semantic(field: &str) -> Option<SemanticType> {
    let name = field.to_lowercase();

    if ["date", "time", "dob"].iter().any(|hint| name.contains(hint)) {
        return Some(SemanticType::Temporal);
    }

    if ["worth", "balance", "amount", "price"]
        .iter()
        .any(|hint| name.contains(hint))
    {
        return Some(SemanticType::Number);
    }

    if name.starts_with("is") || name == "active" || name == "enabled" {
        return Some(SemanticType::Boolean);
    }

    None
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn temporal_value(value: &Value) -> Option<TemporalValue> {
    let text = value.as_str()?;

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(TemporalValue::DateTime(datetime));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(TemporalValue::Date)
}

fn boolean_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => {
            let text = text.trim();
            if text.eq_ignore_ascii_case("true") || text == "1" {
                Some(true)
            } else if text.eq_ignore_ascii_case("false") || text == "0" {
                Some(false)
            } else {
                None
            }
        }
        Value::Number(number) => match number.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lexical_compare(left: &Value, right: &Value) -> Ordering {
    canonical_text(left).cmp(&canonical_text(right))
}

fn canonical_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
