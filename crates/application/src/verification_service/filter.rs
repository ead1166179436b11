use std::cmp::Ordering;

use veriqry_domain::{EntitySchema, FilterOperator, FilterSpec, NotificationLog, Record};

use crate::comparator::{compare_values, values_match_eq};
use crate::field_extract::extract_field;

use super::Outcome;

/// Proves every returned record satisfies the declared filter conditions.
///
/// Per field the effective predicate is the conjunction of all range
/// conditions and only the *last* equality condition: multiple equality
/// filters on one field do not intersect, the latest overrides earlier
/// ones. The first failing operator halts that record's check; scanning
/// continues with the remaining records.
pub(crate) fn check_filters(
    records: &[Record],
    spec: &FilterSpec,
    schema: Option<&EntitySchema>,
    notifications: &NotificationLog,
    outcome: &mut Outcome,
) {
    for field_filter in spec.fields() {
        let field = field_filter.field();

        let mut conditions = Vec::new();
        let mut ambiguous = false;
        for condition in field_filter.conditions() {
            match condition.resolve_operator() {
                Ok(operator) => conditions.push((operator, condition.value())),
                Err(error) => {
                    // Fail-open: a bad operator token skips this field only.
                    outcome.issue(format!("filter '{field}': {error}"));
                    ambiguous = true;
                    break;
                }
            }
        }
        if ambiguous {
            continue;
        }

        let entries = extract_field(records, field);
        outcome.record_field(
            format!("filter_{field}"),
            entries.iter().map(|entry| entry.value.clone()).collect(),
        );

        if entries.is_empty() {
            // Vacuously valid, unless the field is unknown to the schema
            // and no corroborating warning was surfaced.
            let unknown = schema.is_some_and(|schema| !schema.knows_field(field));
            if unknown && !notifications.mentions_field(field) {
                outcome.issue(format!(
                    "filter field '{field}' is not in the schema and the response did not flag it"
                ));
            }
            continue;
        }

        let last_eq = conditions
            .iter()
            .rposition(|(operator, _)| *operator == FilterOperator::Eq);
        let declared = schema.and_then(|schema| schema.field_type(field));

        for entry in &entries {
            for (position, (operator, expected)) in conditions.iter().enumerate() {
                if *operator == FilterOperator::Eq && Some(position) != last_eq {
                    // Last-wins: earlier equality conditions are overridden.
                    continue;
                }

                let comparison = compare_values(&entry.value, expected, field, declared);
                let satisfied = match operator {
                    FilterOperator::Eq => values_match_eq(&entry.value, expected, field, declared),
                    FilterOperator::Gt => comparison == Ordering::Greater,
                    FilterOperator::Gte => comparison != Ordering::Less,
                    FilterOperator::Lt => comparison == Ordering::Less,
                    FilterOperator::Lte => comparison != Ordering::Greater,
                };

                if !satisfied {
                    outcome.issue(format!(
                        "filter '{field}' record {}: value {} violates {} {}",
                        entry.record_index,
                        entry.value,
                        operator.as_str(),
                        expected
                    ));
                    break;
                }
            }
        }
    }
}
