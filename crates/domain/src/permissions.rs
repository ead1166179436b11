use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use veriqry_core::{AppError, AppResult};

/// Role entry that applies to every entity without a specific entry.
pub const WILDCARD_ENTITY: &str = "*";

/// One CRUD operation probed against a live endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudOperation {
    /// Record creation.
    Create,
    /// Record read.
    Read,
    /// Record update.
    Update,
    /// Record deletion.
    Delete,
}

impl CrudOperation {
    /// All operations in probe order.
    pub const ALL: [Self; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

    /// Returns the permission letter for this operation.
    #[must_use]
    pub fn letter(&self) -> char {
        match self {
            Self::Create => 'c',
            Self::Read => 'r',
            Self::Update => 'u',
            Self::Delete => 'd',
        }
    }

    /// Returns the stable operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Returns whether a CRUD-letter permission string grants this operation.
    #[must_use]
    pub fn permitted_by(&self, permission: &str) -> bool {
        permission
            .chars()
            .any(|letter| letter.eq_ignore_ascii_case(&self.letter()))
    }
}

/// A role's raw per-entity permission document: entity name (or the `"*"`
/// wildcard) mapped to a CRUD-letter string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPermissions {
    entries: BTreeMap<String, String>,
}

impl RawPermissions {
    /// Creates raw permissions from entity/letters pairs.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Parses raw permissions from a JSON object of string values.
    pub fn from_value(value: &Value) -> AppResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            AppError::Validation("raw permission document must be a JSON object".to_owned())
        })?;

        let mut entries = BTreeMap::new();
        for (entity, letters) in object {
            let letters = letters.as_str().ok_or_else(|| {
                AppError::Validation(format!(
                    "raw permission for '{entity}' must be a CRUD-letter string"
                ))
            })?;
            entries.insert(entity.clone(), letters.to_owned());
        }

        Ok(Self { entries })
    }

    /// Returns the effective permission string for an entity: the specific
    /// entry (matched case-insensitively) if present, else the wildcard
    /// entry, else nothing. An empty string counts as no permission.
    #[must_use]
    pub fn effective_for(&self, entity: &str) -> Option<&str> {
        let specific = self
            .entries
            .get(entity)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(entity))
                    .map(|(_, letters)| letters)
            })
            .map(String::as_str);

        specific
            .or_else(|| self.entries.get(WILDCARD_ENTITY).map(String::as_str))
            .filter(|letters| !letters.is_empty())
    }

    /// Expands this document over the known entity names.
    ///
    /// Entity names are deduplicated and visited in sorted order so the
    /// expansion is deterministic regardless of catalog order. Entities
    /// with an empty effective permission are excluded entirely.
    #[must_use]
    pub fn expand(&self, entity_names: &[String]) -> ExpandedPermissions {
        let names: BTreeSet<&String> = entity_names.iter().collect();

        let mut dashboard = BTreeSet::new();
        let mut entity = BTreeMap::new();
        for name in names {
            if let Some(letters) = self.effective_for(name) {
                dashboard.insert(name.clone());
                entity.insert(name.clone(), letters.to_owned());
            }
        }

        ExpandedPermissions {
            dashboard,
            entity,
            reports: Vec::new(),
        }
    }
}

/// A principal's expanded per-entity permissions, as advertised by the
/// service or recomputed independently from its role.
///
/// Invariant: `dashboard` holds exactly the entities with a non-empty
/// effective permission, and `entity` maps each of them to that permission
/// string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedPermissions {
    dashboard: BTreeSet<String>,
    entity: BTreeMap<String, String>,
    reports: Vec<String>,
}

impl ExpandedPermissions {
    /// Creates expanded permissions from their parts.
    #[must_use]
    pub fn new(
        dashboard: BTreeSet<String>,
        entity: BTreeMap<String, String>,
        reports: Vec<String>,
    ) -> Self {
        Self {
            dashboard,
            entity,
            reports,
        }
    }

    /// Returns the entities with any non-empty effective permission.
    #[must_use]
    pub fn dashboard(&self) -> &BTreeSet<String> {
        &self.dashboard
    }

    /// Returns the per-entity permission strings.
    #[must_use]
    pub fn entity(&self) -> &BTreeMap<String, String> {
        &self.entity
    }

    /// Returns the report identifiers.
    #[must_use]
    pub fn reports(&self) -> &[String] {
        &self.reports
    }

    /// Returns the permission string for one entity, if any.
    #[must_use]
    pub fn entity_permission(&self, entity: &str) -> Option<&str> {
        self.entity.get(entity).map(String::as_str)
    }
}
