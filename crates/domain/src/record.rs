use serde::Serialize;
use serde_json::{Map, Value};
use veriqry_core::{AppError, AppResult};

/// One JSON object returned by a list/collection endpoint.
///
/// Immutable once constructed; lookups never mutate and never fail for
/// shape problems, they simply return `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    data: Map<String, Value>,
}

impl Record {
    /// Creates a record from a JSON value, which must be an object.
    pub fn new(value: Value) -> AppResult<Self> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(AppError::Validation(format!(
                "record must be a JSON object, got {other}"
            ))),
        }
    }

    /// Returns whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Looks up a field value: exact key match first, then a
    /// case-insensitive scan where the first hit wins.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(name) {
            return Some(value);
        }

        self.data
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Looks up a field inside a joined-view scope: a nested object keyed
    /// by `entity`, else a flattened `"entity.field"` key. The same
    /// exact-then-case-insensitive rule applies inside the scope.
    #[must_use]
    pub fn nested_field(&self, entity: &str, field: &str) -> Option<&Value> {
        if let Some(Value::Object(scope)) = self.field(entity) {
            if let Some(value) = scope.get(field) {
                return Some(value);
            }

            if let Some(value) = scope
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(field))
                .map(|(_, value)| value)
            {
                return Some(value);
            }
        }

        self.field(format!("{entity}.{field}").as_str())
    }

    /// Returns the field names present on this record.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}
