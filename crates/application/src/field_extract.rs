use serde_json::Value;
use veriqry_domain::Record;

/// One extracted field value with the index of the record it came from.
///
/// Records lacking the field contribute no entry at all, so validators can
/// distinguish "field entirely absent" (likely a bad parameter) from
/// "field present but null" (valid; nulls sort first).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    /// Position of the source record in the response.
    pub record_index: usize,
    /// The extracted value.
    pub value: Value,
}

/// Extracts a named field from every record that carries it.
#[must_use]
pub fn extract_field(records: &[Record], field: &str) -> Vec<FieldEntry> {
    records
        .iter()
        .enumerate()
        .filter_map(|(record_index, record)| {
            record.field(field).map(|value| FieldEntry {
                record_index,
                value: value.clone(),
            })
        })
        .collect()
}

/// Extracts a nested field from a joined-view scope on every record that
/// carries it.
#[must_use]
pub fn extract_nested_field(records: &[Record], entity: &str, field: &str) -> Vec<FieldEntry> {
    records
        .iter()
        .enumerate()
        .filter_map(|(record_index, record)| {
            record.nested_field(entity, field).map(|value| FieldEntry {
                record_index,
                value: value.clone(),
            })
        })
        .collect()
}
