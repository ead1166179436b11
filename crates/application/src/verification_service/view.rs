use veriqry_domain::{NotificationLog, Record, ViewSpec};

use crate::field_extract::extract_nested_field;

use super::Outcome;

/// Extracts the requested joined-view fields for downstream reporting.
///
/// A requested nested field absent from every record is reported unless
/// the API flagged it through the notification channel.
pub(crate) fn collect_view_fields(
    records: &[Record],
    view: &ViewSpec,
    notifications: &NotificationLog,
    outcome: &mut Outcome,
) {
    for entry in view.entries() {
        for field in entry.fields() {
            let entries = extract_nested_field(records, entry.entity(), field);
            outcome.record_field(
                format!("view_{}.{}", entry.entity(), field),
                entries.iter().map(|entry| entry.value.clone()).collect(),
            );

            if entries.is_empty() && !records.is_empty() && !notifications.mentions_field(field) {
                outcome.issue(format!(
                    "view field '{}.{}' is missing from every record and was not flagged by the API",
                    entry.entity(),
                    field
                ));
            }
        }
    }
}
