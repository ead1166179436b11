use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veriqry_core::{AppError, AppResult, NonEmptyString};

/// Declared semantic types a schema collaborator may supply per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string field.
    Text,
    /// Numeric field.
    Number,
    /// Boolean field.
    Boolean,
    /// Date-only string field.
    Date,
    /// Date-time string field.
    DateTime,
    /// Arbitrary JSON field.
    Json,
    /// Many-to-one relation field.
    Relation,
}

impl FieldType {
    /// Returns a stable storage value for the field type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Json => "json",
            Self::Relation => "relation",
        }
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "datetime" => Ok(Self::DateTime),
            "json" => Ok(Self::Json),
            "relation" => Ok(Self::Relation),
            _ => Err(AppError::Validation(format!("unknown field type '{value}'"))),
        }
    }
}

/// Declared field types for one entity, supplied by a schema collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    entity_logical_name: NonEmptyString,
    fields: BTreeMap<String, FieldType>,
}

impl EntitySchema {
    /// Creates a validated entity schema.
    pub fn new(
        entity_logical_name: impl Into<String>,
        fields: BTreeMap<String, FieldType>,
    ) -> AppResult<Self> {
        Ok(Self {
            entity_logical_name: NonEmptyString::new(entity_logical_name)?,
            fields,
        })
    }

    /// Returns the entity logical name.
    #[must_use]
    pub fn entity_logical_name(&self) -> &NonEmptyString {
        &self.entity_logical_name
    }

    /// Returns the declared type for a field, matched exactly first and
    /// case-insensitively otherwise.
    #[must_use]
    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        if let Some(field_type) = self.fields.get(field) {
            return Some(*field_type);
        }

        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(field))
            .map(|(_, field_type)| *field_type)
    }

    /// Returns whether the schema declares the field at all.
    #[must_use]
    pub fn knows_field(&self, field: &str) -> bool {
        self.field_type(field).is_some()
    }
}
