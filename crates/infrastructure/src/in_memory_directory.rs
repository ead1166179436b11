use std::collections::BTreeMap;

use async_trait::async_trait;
use http::StatusCode;
use veriqry_application::{
    CrudProbe, EntityCatalog, PermissionVerifier, PrincipalDirectory, RoleDirectory,
};
use veriqry_core::{AppError, AppResult};
use veriqry_domain::{CrudOperation, RawPermissions};

/// In-memory implementation of the verifier ports for tests and offline
/// runs.
///
/// Probe behavior is derived from a configurable permission document, so a
/// directory can deliberately diverge from the role's raw document to
/// simulate a target whose enforcement disagrees with its advertising.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    entities: Vec<String>,
    role_bindings: BTreeMap<String, String>,
    role_permissions: BTreeMap<String, RawPermissions>,
    probe_behavior: RawPermissions,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a known entity name.
    #[must_use]
    pub fn with_entity(mut self, name: impl Into<String>) -> Self {
        self.entities.push(name.into());
        self
    }

    /// Binds a principal to a role.
    #[must_use]
    pub fn with_role_binding(
        mut self,
        principal: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        self.role_bindings.insert(principal.into(), role.into());
        self
    }

    /// Registers a role's raw permission document.
    #[must_use]
    pub fn with_role_permissions(
        mut self,
        role: impl Into<String>,
        permissions: RawPermissions,
    ) -> Self {
        self.role_permissions.insert(role.into(), permissions);
        self
    }

    /// Sets the permission document the probe endpoint actually enforces.
    #[must_use]
    pub fn with_probe_behavior(mut self, behavior: RawPermissions) -> Self {
        self.probe_behavior = behavior;
        self
    }
}

#[async_trait]
impl EntityCatalog for InMemoryDirectory {
    async fn list_entity_names(&self) -> AppResult<Vec<String>> {
        Ok(self.entities.clone())
    }
}

#[async_trait]
impl PrincipalDirectory for InMemoryDirectory {
    async fn resolve_role(&self, principal: &str) -> AppResult<String> {
        self.role_bindings
            .get(principal)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("principal '{principal}' is not bound")))
    }
}

#[async_trait]
impl RoleDirectory for InMemoryDirectory {
    async fn fetch_raw_permissions(&self, role: &str) -> AppResult<RawPermissions> {
        self.role_permissions
            .get(role)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("role '{role}' has no permission document")))
    }
}

#[async_trait]
impl CrudProbe for InMemoryDirectory {
    async fn probe(&self, entity: &str, operation: CrudOperation) -> AppResult<StatusCode> {
        let permission = self.probe_behavior.effective_for(entity);
        Ok(PermissionVerifier::expected_probe_status(
            operation, permission,
        ))
    }
}
