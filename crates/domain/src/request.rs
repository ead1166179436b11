use serde::{Deserialize, Serialize};
use serde_json::Value;
use veriqry_core::{AppError, AppResult};

/// Sort direction for one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Parses transport value into a sort direction.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One key of a multi-key sort request, as received on the wire.
///
/// The direction token is kept verbatim: a missing token defaults to
/// ascending at resolution time, an unknown token is reported by the
/// validator and the key is skipped rather than failing the whole verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    field: String,
    direction: Option<String>,
}

impl SortKey {
    /// Creates a sort key from a field name and an optional direction token.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: Option<String>) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the raw direction token, if one was supplied.
    #[must_use]
    pub fn direction_token(&self) -> Option<&str> {
        self.direction.as_deref()
    }

    /// Resolves the direction token, defaulting to ascending when absent.
    pub fn resolve_direction(&self) -> AppResult<SortDirection> {
        match self.direction.as_deref() {
            None => Ok(SortDirection::Asc),
            Some(token) => SortDirection::parse_transport(token),
        }
    }
}

/// Ordered multi-key sort request; earlier keys take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Creates a sort spec from ordered keys.
    #[must_use]
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    /// Returns the ordered sort keys.
    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Returns whether no sort was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Equality comparison.
    Eq,
    /// Greater-than comparison.
    Gt,
    /// Greater-than-or-equal comparison.
    Gte,
    /// Less-than comparison.
    Lt,
    /// Less-than-or-equal comparison.
    Lte,
}

impl FilterOperator {
    /// Parses transport value into an operator.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "eq" => Ok(Self::Eq),
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            "lt" => Ok(Self::Lt),
            "lte" => Ok(Self::Lte),
            _ => Err(AppError::Validation(format!(
                "unknown filter operator '{value}'"
            ))),
        }
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }

    /// Returns whether this operator bounds a range rather than pinning a value.
    #[must_use]
    pub fn is_range(&self) -> bool {
        !matches!(self, Self::Eq)
    }
}

/// One declared filter condition, as received on the wire.
///
/// The operator token is kept verbatim for the same fail-open reason as
/// [`SortKey`]: an unknown token skips the field's check, it does not
/// abort the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    operator: String,
    value: Value,
}

impl FilterCondition {
    /// Creates a filter condition from an operator token and expected value.
    #[must_use]
    pub fn new(operator: impl Into<String>, value: Value) -> Self {
        Self {
            operator: operator.into(),
            value,
        }
    }

    /// Returns the raw operator token.
    #[must_use]
    pub fn operator_token(&self) -> &str {
        self.operator.as_str()
    }

    /// Resolves the operator token.
    pub fn resolve_operator(&self) -> AppResult<FilterOperator> {
        FilterOperator::parse_transport(self.operator.as_str())
    }

    /// Returns the expected value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// All conditions declared for one field, in declaration order.
///
/// Order is significant: among multiple equality conditions only the last
/// one is enforced (last-wins), while range conditions all apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    field: String,
    conditions: Vec<FilterCondition>,
}

impl FieldFilter {
    /// Creates a field filter from ordered conditions.
    #[must_use]
    pub fn new(field: impl Into<String>, conditions: Vec<FilterCondition>) -> Self {
        Self {
            field: field.into(),
            conditions,
        }
    }

    /// Returns the filtered field name.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the declared conditions in declaration order.
    #[must_use]
    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }
}

/// Ordered filter request across fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    fields: Vec<FieldFilter>,
}

impl FilterSpec {
    /// Creates a filter spec from per-field condition lists.
    #[must_use]
    pub fn new(fields: Vec<FieldFilter>) -> Self {
        Self { fields }
    }

    /// Returns the per-field filters.
    #[must_use]
    pub fn fields(&self) -> &[FieldFilter] {
        &self.fields
    }

    /// Returns whether no filter was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Requested nested fields for one joined entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEntry {
    entity: String,
    fields: Vec<String>,
}

impl ViewEntry {
    /// Creates a view entry from an entity name and requested fields.
    #[must_use]
    pub fn new(entity: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            entity: entity.into(),
            fields,
        }
    }

    /// Returns the joined entity name.
    #[must_use]
    pub fn entity(&self) -> &str {
        self.entity.as_str()
    }

    /// Returns the requested nested field names.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Structured form of the `view=` request parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSpec {
    entries: Vec<ViewEntry>,
}

impl ViewSpec {
    /// Creates a view spec from entries.
    #[must_use]
    pub fn new(entries: Vec<ViewEntry>) -> Self {
        Self { entries }
    }

    /// Returns the requested view entries.
    #[must_use]
    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }
}
