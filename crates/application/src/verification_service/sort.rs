use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde_json::Value;
use veriqry_domain::{EntitySchema, FieldType, NotificationLog, Record, SortDirection, SortSpec};

use crate::comparator::compare_values;
use crate::field_extract::extract_field;

use super::Outcome;

static JSON_NULL: Value = Value::Null;

struct ResolvedKey<'a> {
    field: &'a str,
    direction: SortDirection,
    declared: Option<FieldType>,
}

/// Proves the records respect the multi-key sort order.
///
/// Recursive partition-and-validate: correctly sorted data places equal
/// values on the current key in contiguous runs, so each level only has to
/// check run boundaries against the declared direction and recurse into
/// the next key inside each run. Ties on key N are broken by key N+1.
pub(crate) fn check_sort_order(
    records: &[Record],
    spec: &SortSpec,
    schema: Option<&EntitySchema>,
    notifications: &NotificationLog,
    outcome: &mut Outcome,
) {
    if spec.is_empty() {
        return;
    }

    let mut keys = Vec::new();
    for key in spec.keys() {
        let direction = match key.resolve_direction() {
            Ok(direction) => direction,
            Err(error) => {
                // Fail-open: a bad direction token skips this key only.
                outcome.issue(format!("sort '{}': {error}", key.field()));
                continue;
            }
        };

        let entries = extract_field(records, key.field());
        outcome.record_field(
            format!("sort_{}", key.field()),
            entries.iter().map(|entry| entry.value.clone()).collect(),
        );

        if entries.is_empty() && !records.is_empty() {
            if notifications.mentions_field(key.field()) {
                // The API flagged the field itself; empty extraction is
                // expected, not a failure.
                continue;
            }

            outcome.issue(format!(
                "sort field '{}' is missing from every record and was not flagged by the API",
                key.field()
            ));
            continue;
        }

        keys.push(ResolvedKey {
            field: key.field(),
            direction,
            declared: schema.and_then(|schema| schema.field_type(key.field())),
        });
    }

    if records.len() < 2 || keys.is_empty() {
        return;
    }

    let indices: Vec<usize> = (0..records.len()).collect();
    let mut violated = BTreeSet::new();
    validate_level(records, &indices, &keys, &mut violated, outcome);
}

fn validate_level(
    records: &[Record],
    indices: &[usize],
    keys: &[ResolvedKey<'_>],
    violated: &mut BTreeSet<String>,
    outcome: &mut Outcome,
) {
    let Some((key, rest)) = keys.split_first() else {
        return;
    };

    if violated.contains(key.field) {
        return;
    }

    // Records lacking the field contribute no entry at this level.
    let present: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&index| records[index].field(key.field).is_some())
        .collect();

    let value_of = |index: usize| records[index].field(key.field).unwrap_or(&JSON_NULL);

    let mut run_start = 0;
    for position in 1..=present.len() {
        let run_ends = position == present.len()
            || compare_values(
                value_of(present[position - 1]),
                value_of(present[position]),
                key.field,
                key.declared,
            ) != Ordering::Equal;
        if !run_ends {
            continue;
        }

        if position < present.len() {
            let ordering = compare_values(
                value_of(present[position - 1]),
                value_of(present[position]),
                key.field,
                key.declared,
            );
            let expected = match key.direction {
                SortDirection::Asc => Ordering::Less,
                SortDirection::Desc => Ordering::Greater,
            };

            if ordering != expected {
                outcome.issue(format!(
                    "sort '{}' violates {} order between records {} and {}",
                    key.field,
                    key.direction.as_str(),
                    present[position - 1],
                    present[position]
                ));
                violated.insert(key.field.to_owned());
                return;
            }
        }

        if position - run_start > 1 && !rest.is_empty() {
            validate_level(records, &present[run_start..position], rest, violated, outcome);
        }
        run_start = position;
    }
}
