use async_trait::async_trait;
use http::StatusCode;
use veriqry_core::AppResult;
use veriqry_domain::{CrudOperation, RawPermissions};

/// Metadata collaborator listing every known entity name.
#[async_trait]
pub trait EntityCatalog: Send + Sync {
    /// Lists all known entity names.
    async fn list_entity_names(&self) -> AppResult<Vec<String>>;
}

/// Identity collaborator resolving a principal's role binding.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Resolves the role identifier bound to a principal.
    async fn resolve_role(&self, principal: &str) -> AppResult<String>;
}

/// Role collaborator fetching a role's raw permission document.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Fetches the raw per-entity permission map for a role.
    async fn fetch_raw_permissions(&self, role: &str) -> AppResult<RawPermissions>;
}

/// Probe collaborator issuing one live CRUD call through the
/// authenticated session.
///
/// Implementations must use disposable, idempotent probe identifiers;
/// probes that mutate shared fixture data must be serialized by the
/// caller to avoid cross-test interference.
#[async_trait]
pub trait CrudProbe: Send + Sync {
    /// Issues one live call for the operation against a representative
    /// entity and returns the observed status.
    async fn probe(&self, entity: &str, operation: CrudOperation) -> AppResult<StatusCode>;
}
